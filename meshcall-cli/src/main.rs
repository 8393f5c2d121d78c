mod console;
mod terminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use meshcall_relay::{DEFAULT_RELAY_PORT, RelayConfig};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use crate::terminal::JoinArgs;

#[derive(Parser)]
#[command(name = "meshcall")]
#[command(bin_name = "meshcall")]
#[command(about = "Mesh audio/video rooms over a signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay
    Serve {
        #[arg(long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_RELAY_PORT)))]
        bind: SocketAddr,
    },
    /// Join a room as a terminal participant
    Join(JoinArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    match Cli::parse().command {
        Commands::Serve { bind } => {
            println!("{}", format!("🚀 Starting relay on {}", bind).green().bold());
            meshcall_relay::serve(RelayConfig::new(bind)).await?;
        }
        Commands::Join(args) => terminal::run(args).await?,
    }

    Ok(())
}
