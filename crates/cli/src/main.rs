//! StockClaw CLI: the main entry point.
//!
//! Commands:
//! - `serve`    Start the HTTP gateway
//! - `ask`      Single-question or interactive mode
//! - `onboard`  Write a default config file
//! - `doctor`   Check config and reachability of backing services

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "stockclaw",
    about = "StockClaw: autonomous supply-chain agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask the agent a question
    Ask {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Write a default configuration file
    Onboard,

    /// Diagnose configuration and connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask { message } => commands::ask::run(message).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_with_port() {
        let cli = Cli::try_parse_from(["stockclaw", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000) }));
        assert!(!cli.verbose);
    }

    #[test]
    fn parses_ask_with_global_verbose() {
        let cli = Cli::try_parse_from(["stockclaw", "ask", "-m", "check standing desks", "-v"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Ask { message } => assert_eq!(message.as_deref(), Some("check standing desks")),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["stockclaw", "daemon"]).is_err());
    }
}
