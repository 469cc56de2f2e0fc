//! AWD Plugin Server
//!
//! Runs the attack & defense plugin API as a standalone HTTP server.

use anyhow::Result;
use awd_challenge::{AwdStorage, PluginConfig, PluginState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "awd-server")]
#[command(about = "Attack & Defense challenge plugin server")]
struct Args {
    /// Server port
    #[arg(short, long, default_value = "8000", env = "AWD_PORT")]
    port: u16,

    /// Server host
    #[arg(long, default_value = "0.0.0.0", env = "AWD_HOST")]
    host: String,

    /// SQLite database path
    #[arg(short, long, default_value = "data/awd.db", env = "AWD_DB")]
    db: PathBuf,

    /// Default defense points for new challenges
    #[arg(long, default_value = "5", env = "AWD_DEFENSE_POINT")]
    defense_point: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("awd_challenge=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!("Starting AWD plugin server");
    info!("  Database: {:?}", args.db);
    info!("  Listening on: {}:{}", args.host, args.port);

    let storage = AwdStorage::new(args.db)?;
    let config = PluginConfig {
        defense_point: args.defense_point,
        ..Default::default()
    };

    let state = Arc::new(PluginState::new(storage, config));

    awd_challenge::run_server(state, &args.host, args.port).await?;

    Ok(())
}
