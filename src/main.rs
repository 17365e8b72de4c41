#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

use anyhow::Result;
use campuslink::config::Config;
use campuslink::gateway::{run_gateway, AppState};
use campuslink::matching::MatchEngine;
use campuslink::store::SqliteStore;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "campuslink", version, about = "CampusLink platform core")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway (default)
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Recompute skill matches for one student and print the report
    Recompute {
        student_id: String,
    },
    /// Create the workspace, config, and database schema, then exit
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let mut config = Config::load_or_init()?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            let store = Arc::new(SqliteStore::open(&config.db_path())?);
            let state = AppState::new(store, &config);
            run_gateway(&config, state).await
        }
        Commands::Recompute { student_id } => {
            let store = Arc::new(SqliteStore::open(&config.db_path())?);
            let engine = MatchEngine::new(store);
            let report = engine.recompute_for_student(&student_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Init => {
            let path = config.db_path();
            SqliteStore::open(&path)?;
            tracing::info!("workspace ready at {}", config.workspace_dir.display());
            tracing::info!("database ready at {}", path.display());
            Ok(())
        }
    }
}
