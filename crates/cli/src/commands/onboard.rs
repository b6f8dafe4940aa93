//! `stockclaw onboard`: first-time setup.

use std::path::Path;

use stockclaw_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();

    println!("StockClaw First-Time Setup");
    println!("==========================\n");

    match write_default_config(&config_dir)? {
        Some(path) => {
            println!("  Created config.toml at: {}", path.display());
            println!("\n  Next steps:");
            println!("   1. Set GROQ_API_KEY (or api_key in the config file)");
            println!("   2. Point [inventory] base_url at your inventory service");
            println!("   3. Optionally set PINECONE_API_KEY / PINECONE_INDEX_HOST for policy search");
            println!("   4. Run `stockclaw doctor`, then `stockclaw serve`\n");
        }
        None => {
            println!(
                "  Config already exists at: {}",
                config_dir.join("config.toml").display()
            );
            println!("   Edit it manually or delete and re-run onboard.\n");
        }
    }

    Ok(())
}

/// Write the default config into `dir`. Returns `None` if one already exists.
pub fn write_default_config(dir: &Path) -> std::io::Result<Option<std::path::PathBuf>> {
    let path = dir.join("config.toml");
    if path.exists() {
        return Ok(None);
    }
    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;
    Ok(Some(path))
}
