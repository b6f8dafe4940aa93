//! `stockclaw doctor`: diagnose configuration and connectivity.

use stockclaw_config::AppConfig;
use stockclaw_core::provider::Provider;
use stockclaw_core::tool::Tool;
use stockclaw_tools::CheckInventoryTool;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("StockClaw Doctor: System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file, using defaults (run `stockclaw onboard`)");
    }
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid config.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured for '{}'", config.default_provider);
    } else {
        println!("  ❌ No API key: set GROQ_API_KEY or api_key in config.toml");
        issues += 1;
    }

    if config.policy.is_configured() {
        println!("  ✅ Policy index configured");
    } else {
        println!("  ⚠️  Policy index not configured: lookups will run in offline mode");
    }

    // Inventory service
    let client = stockclaw_tools::http_client(config.inventory.timeout_secs)?;
    let inventory = CheckInventoryTool::new(client, &config.inventory.base_url);
    match inventory.execute(serde_json::json!({})).await {
        Ok(out) if out.success => {
            let products = out.content.lines().filter(|l| l.starts_with("- ")).count();
            println!(
                "  ✅ Inventory service reachable ({products} products at {})",
                config.inventory.base_url
            );
        }
        Ok(out) => {
            println!("  ❌ Inventory service: {}", out.content);
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Inventory service: {e}");
            issues += 1;
        }
    }

    // Model backend
    if config.has_api_key() {
        let router = stockclaw_providers::build_from_config(&config);
        match router.default_provider() {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Model backend '{}' reachable", provider.name()),
                Ok(false) => {
                    println!("  ❌ Model backend '{}' rejected the request", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Model backend '{}': {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  ❌ Provider '{}' is not available", config.default_provider);
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
