//! Wire types of the inventory and ordering service.
//!
//! The service speaks camelCase JSON; unknown fields are ignored.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A supplier as embedded in each product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
}

/// A product with its current stock and reorder threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    pub stock_quantity: i64,
    pub min_stock_level: i64,
    pub supplier: Supplier,
}

impl Product {
    /// Whether stock has fallen below the reorder threshold.
    pub fn is_below_threshold(&self) -> bool {
        self.stock_quantity < self.min_stock_level
    }
}

/// Lifecycle of a purchase order on the ordering service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingApproval,
    Approved,
    Rejected,
    SentToSupplier,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::SentToSupplier => "SENT_TO_SUPPLIER",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub product_id: i64,
    pub quantity: i64,
}

/// A purchase order as returned by the ordering service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: i64,
    pub status: OrderStatus,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub created_at: Option<chrono::NaiveDateTime>,
}
