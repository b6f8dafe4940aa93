//! Policy lookup tool: semantic search over supplier contracts and shipping rules.
//!
//! The query is embedded with a Hugging Face feature-extraction endpoint and
//! matched against a Pinecone index. When no index is configured the tool runs
//! in offline mode and tells the model to assume standard terms.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use stockclaw_core::error::ToolError;
use stockclaw_core::tool::{Tool, ToolKind, ToolOutput};
use tracing::{debug, warn};

/// One passage returned by a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyMatch {
    pub text: String,
    pub filename: Option<String>,
    pub score: f32,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PolicySearchError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("index query failed: {0}")]
    Index(String),
}

/// A searchable policy store.
#[async_trait]
pub trait PolicyIndex: Send + Sync {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<PolicyMatch>, PolicySearchError>;
}

/// Turns text into a dense vector via the Hugging Face inference API.
pub struct HuggingFaceEmbedder {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HuggingFaceEmbedder {
    pub fn new(
        client: reqwest::Client,
        embedding_url: &str,
        model: &str,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            url: format!("{}/{}", embedding_url.trim_end_matches('/'), model),
            token,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, PolicySearchError> {
        let mut request = self.client.post(&self.url).json(&serde_json::json!({
            "inputs": text,
            "options": {"wait_for_model": true}
        }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PolicySearchError::Embedding(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PolicySearchError::Embedding(format!(
                "embedding service returned {}",
                status.as_u16()
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| PolicySearchError::Embedding(e.to_string()))?;
        let vector = match body {
            EmbeddingResponse::Flat(v) => v,
            EmbeddingResponse::Batched(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            EmbeddingResponse::Batched(_) => Vec::new(),
        };
        if vector.is_empty() {
            return Err(PolicySearchError::Embedding("empty embedding".into()));
        }
        Ok(vector)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Flat(Vec<f32>),
    Batched(Vec<Vec<f32>>),
}

/// A Pinecone serverless index addressed by its data-plane host.
pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    api_key: String,
    embedder: HuggingFaceEmbedder,
}

impl PineconeIndex {
    pub fn new(
        client: reqwest::Client,
        host: &str,
        api_key: impl Into<String>,
        embedder: HuggingFaceEmbedder,
    ) -> Self {
        let host = host.trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        Self {
            client,
            host,
            api_key: api_key.into(),
            embedder,
        }
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

#[async_trait]
impl PolicyIndex for PineconeIndex {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<PolicyMatch>, PolicySearchError> {
        let vector = self.embedder.embed(query).await?;

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .json(&serde_json::json!({
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true
            }))
            .send()
            .await
            .map_err(|e| PolicySearchError::Index(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PolicySearchError::Index(format!(
                "index returned {}",
                status.as_u16()
            )));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| PolicySearchError::Index(e.to_string()))?;

        Ok(body
            .matches
            .into_iter()
            .map(|m| PolicyMatch {
                text: m
                    .metadata
                    .get("text")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                filename: m
                    .metadata
                    .get("filename")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                score: m.score,
            })
            .collect())
    }
}

pub struct LookupPolicyTool {
    index: Option<Arc<dyn PolicyIndex>>,
    top_k: usize,
}

impl LookupPolicyTool {
    pub fn new(index: Arc<dyn PolicyIndex>, top_k: usize) -> Self {
        Self {
            index: Some(index),
            top_k: top_k.max(1),
        }
    }

    /// A tool with no backing index; every lookup answers in offline mode.
    pub fn offline() -> Self {
        Self {
            index: None,
            top_k: 3,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.index.is_none()
    }
}

/// Concatenate matches as `Source (<file>): <text>` blocks.
pub fn render_matches(matches: &[PolicyMatch]) -> String {
    let mut context = String::new();
    for m in matches {
        let filename = m.filename.as_deref().unwrap_or("Unknown");
        let _ = write!(context, "Source ({filename}): {}\n---\n", m.text);
    }
    context
}

#[async_trait]
impl Tool for LookupPolicyTool {
    fn kind(&self) -> ToolKind {
        ToolKind::LookupPolicy
    }

    fn description(&self) -> &str {
        "Useful for checking supplier contracts, shipping policies, or rules. Input should be a \
         specific question like \"What is the minimum order for Apex Furniture?\"."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The policy question to search for"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let Some(index) = &self.index else {
            return Ok(ToolOutput::failure(
                "System Error: Policy database is currently offline. Assume standard terms apply.",
            ));
        };

        debug!(query, top_k = self.top_k, "lookup_policy");
        match index.search(query, self.top_k).await {
            Ok(matches) => {
                for m in &matches {
                    debug!(source = ?m.filename, score = m.score, "Policy match");
                }
                let context = render_matches(&matches);
                if context.is_empty() {
                    Ok(ToolOutput::failure(
                        "Result: No specific policy found in the database. DO NOT RETRY. \
                         Proceed with available information.",
                    ))
                } else {
                    Ok(ToolOutput::success(context))
                }
            }
            Err(e) => {
                warn!(error = %e, "Policy search failed");
                Ok(ToolOutput::failure(format!(
                    "Error searching policies: {e}. DO NOT RETRY."
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::Json;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    struct FakeIndex(Result<Vec<PolicyMatch>, PolicySearchError>);

    #[async_trait]
    impl PolicyIndex for FakeIndex {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
        ) -> Result<Vec<PolicyMatch>, PolicySearchError> {
            self.0.clone()
        }
    }

    fn tool_with(result: Result<Vec<PolicyMatch>, PolicySearchError>) -> LookupPolicyTool {
        LookupPolicyTool::new(Arc::new(FakeIndex(result)), 3)
    }

    #[tokio::test]
    async fn matches_are_rendered_with_sources() {
        let tool = tool_with(Ok(vec![
            PolicyMatch {
                text: "Minimum order is 10 units.".into(),
                filename: Some("apex_contract.pdf".into()),
                score: 0.91,
            },
            PolicyMatch {
                text: "Shipping takes 5 days.".into(),
                filename: None,
                score: 0.72,
            },
        ]));

        let out = tool
            .execute(serde_json::json!({"query": "apex minimum order"}))
            .await
            .unwrap();
        assert!(out.success);
        assert_eq!(
            out.content,
            "Source (apex_contract.pdf): Minimum order is 10 units.\n---\n\
             Source (Unknown): Shipping takes 5 days.\n---\n"
        );
    }

    #[tokio::test]
    async fn empty_result_says_do_not_retry() {
        let out = tool_with(Ok(vec![]))
            .execute(serde_json::json!({"query": "apex"}))
            .await
            .unwrap();
        assert!(!out.success);
        assert!(!out.retryable);
        assert!(out.content.starts_with("Result: No specific policy found"));
        assert!(out.content.contains("DO NOT RETRY"));
    }

    #[tokio::test]
    async fn offline_mode() {
        let tool = LookupPolicyTool::offline();
        assert!(tool.is_offline());
        let out = tool
            .execute(serde_json::json!({"query": "apex"}))
            .await
            .unwrap();
        assert_eq!(
            out.content,
            "System Error: Policy database is currently offline. Assume standard terms apply."
        );
    }

    #[tokio::test]
    async fn search_error_is_text() {
        let out = tool_with(Err(PolicySearchError::Index("index returned 500".into())))
            .execute(serde_json::json!({"query": "apex"}))
            .await
            .unwrap();
        assert_eq!(
            out.content,
            "Error searching policies: index query failed: index returned 500. DO NOT RETRY."
        );
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let err = LookupPolicyTool::offline()
            .execute(serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn pinecone_query_roundtrip() {
        let app = axum::Router::new()
            .route(
                "/embed/all-MiniLM-L6-v2",
                post(|headers: HeaderMap| async move {
                    assert_eq!(headers["authorization"], "Bearer hf-test");
                    Json(serde_json::json!([0.1, 0.2, 0.3]))
                }),
            )
            .route(
                "/query",
                post(
                    |headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                        assert_eq!(headers["api-key"], "pc-test");
                        assert_eq!(body["topK"], 3);
                        assert_eq!(body["includeMetadata"], true);
                        assert_eq!(body["vector"].as_array().map(Vec::len), Some(3));
                        Json(serde_json::json!({
                            "matches": [{
                                "id": "doc-1",
                                "score": 0.88,
                                "metadata": {"text": "Net 30 payment terms.", "filename": "terms.txt"}
                            }]
                        }))
                    },
                ),
            );
        let base = serve(app).await;
        let client = reqwest::Client::new();
        let embedder = HuggingFaceEmbedder::new(
            client.clone(),
            &format!("{base}/embed"),
            "all-MiniLM-L6-v2",
            Some("hf-test".into()),
        );
        let index = PineconeIndex::new(client, &base, "pc-test", embedder);

        let matches = index.search("payment terms", 3).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].filename.as_deref(), Some("terms.txt"));
        assert_eq!(matches[0].text, "Net 30 payment terms.");
    }

    #[tokio::test]
    async fn batched_embedding_is_accepted() {
        let app = axum::Router::new().route(
            "/embed/m",
            post(|| async { Json(serde_json::json!([[0.5, 0.5]])) }),
        );
        let base = serve(app).await;
        let embedder =
            HuggingFaceEmbedder::new(reqwest::Client::new(), &format!("{base}/embed"), "m", None);
        assert_eq!(embedder.embed("x").await.unwrap(), vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn embedding_failure_surfaces() {
        let app = axum::Router::new().route(
            "/embed/m",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base = serve(app).await;
        let client = reqwest::Client::new();
        let embedder = HuggingFaceEmbedder::new(client.clone(), &format!("{base}/embed"), "m", None);
        let index = PineconeIndex::new(client, &base, "pc", embedder);

        let err = index.search("x", 3).await.unwrap_err();
        assert!(matches!(err, PolicySearchError::Embedding(_)));
    }

    #[test]
    fn bare_host_gets_https() {
        let client = reqwest::Client::new();
        let embedder = HuggingFaceEmbedder::new(client.clone(), "http://e", "m", None);
        let index = PineconeIndex::new(client, "policies-abc.svc.pinecone.io", "k", embedder);
        assert_eq!(index.host, "https://policies-abc.svc.pinecone.io");
    }
}
