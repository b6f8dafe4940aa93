//! `stockclaw ask`: single-question or interactive mode.

use std::io::Write;

use stockclaw_config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    // Check for API key early and give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GROQ_API_KEY=gsk_...        (default provider)");
        eprintln!("    OPENAI_API_KEY=sk-...       (with STOCKCLAW_PROVIDER=openai)");
        eprintln!("    STOCKCLAW_API_KEY=...       (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let agent = super::build_agent(&config)?;

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let response = agent.run(&msg).await?;
        eprint!("\r              \r");
        println!("{response}");
        return Ok(());
    }

    println!();
    println!("  StockClaw Agent (interactive)");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Inventory: {}", config.inventory.base_url);
    println!("  Turns:     up to {} per question", agent.max_turns());
    println!();
    println!("  Each question starts a fresh session.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        match agent.run(line).await {
            Ok(response) => println!("\n  Agent > {response}\n"),
            Err(e) => eprintln!("\n  Error: {e}\n"),
        }
    }

    println!("  Goodbye!");
    Ok(())
}
