//! SWAPRO sync store - Main Server
//!
//! Serves the recruitment store over HTTP/WebSocket, or prints stats for a
//! seed file.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use swapro::recruitment::Role;
use swapro::{build_store, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "swapro")]
#[command(about = "SWAPRO recruitment sync store")]
struct Cli {
    /// Path to the YAML config file (defaults to ./config.yaml)
    #[arg(short, long, global = true, env = "SWAPRO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the sync server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Seed file loaded at startup (overrides config)
        #[arg(short, long)]
        seed: Option<PathBuf>,
    },

    /// Print dashboard stats for a seed file as JSON
    Stats {
        /// Seed file to load
        #[arg(short, long)]
        seed: PathBuf,

        /// Role whose stats to compute
        #[arg(short, long, value_enum, default_value = "admin")]
        role: RoleArg,

        /// Applicant user id (required for the applicant role)
        #[arg(short, long)]
        user_id: Option<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RoleArg {
    Admin,
    Applicant,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Role::Admin,
            RoleArg::Applicant => Role::Applicant,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,swapro=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, seed } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            if seed.is_some() {
                config.seed_path = seed;
            }
            swapro::start_server(config).await
        }
        Commands::Stats {
            seed,
            role,
            user_id,
        } => {
            config.seed_path = Some(seed);
            run_stats(&config, role.into(), user_id.as_deref())
        }
    }
}

fn run_stats(config: &Config, role: Role, user_id: Option<&str>) -> Result<()> {
    let store = build_store(config)?;
    let stats = store.get_stats(role, user_id)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
