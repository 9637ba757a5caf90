//! SWAPRO recruitment sync store
//!
//! A single in-process store shared by the admin and applicant views of the
//! recruitment platform:
//! - Keyed collections of jobs, candidates, applications and interviews
//! - Per-owner message threads, document folders and notification inboxes
//! - A topic event bus so every view sees each change as it happens
//! - Cascading updates (interviews move applications, status changes notify)
//! - HTTP + WebSocket API over the store

pub mod api;
pub mod events;
pub mod recruitment;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use events::EventBus;
use store::{SeedData, SyncStore};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub store: StoreYamlConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

/// Store configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreYamlConfig {
    /// Capacity of the broadcast channel feeding WebSocket clients
    pub event_capacity: usize,
    /// Simulated backend round-trip for `POST /api/sync`
    pub sync_delay_ms: u64,
    /// Optional YAML file loaded into the store at startup
    pub seed_path: Option<String>,
}

impl Default for StoreYamlConfig {
    fn default() -> Self {
        Self {
            event_capacity: 1024,
            sync_delay_ms: 1000,
            seed_path: None,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub event_capacity: usize,
    pub sync_delay_ms: u64,
    pub seed_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_yaml(YamlConfig::default())
    }
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. A missing file
    /// falls back to env vars / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);
        let defaults = Self::from_yaml(yaml);

        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
            event_capacity: parse_env("EVENT_CAPACITY").unwrap_or(defaults.event_capacity),
            sync_delay_ms: parse_env("SYNC_DELAY_MS").unwrap_or(defaults.sync_delay_ms),
            seed_path: std::env::var("SEED_PATH")
                .ok()
                .map(PathBuf::from)
                .or(defaults.seed_path),
        })
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        Self {
            server_host: yaml.server.host,
            server_port: yaml.server.port,
            event_capacity: yaml.store.event_capacity,
            sync_delay_ms: yaml.store.sync_delay_ms,
            seed_path: yaml.store.seed_path.map(PathBuf::from),
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    pub fn sync_delay(&self) -> Duration {
        Duration::from_millis(self.sync_delay_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_env<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={}", var, raw);
            None
        }
    }
}

// ============================================================================
// Startup
// ============================================================================

/// Build a store from the config, seeding it when a seed file is configured
pub fn build_store(config: &Config) -> Result<SyncStore> {
    let store = SyncStore::with_bus(EventBus::new(config.event_capacity))
        .with_sync_delay(config.sync_delay());

    if let Some(path) = &config.seed_path {
        let seed = SeedData::from_yaml_file(path)?;
        store.seed(seed);
    }
    Ok(store)
}

/// Start the HTTP server and block until it exits
pub async fn start_server(config: Config) -> Result<()> {
    let store = Arc::new(build_store(&config)?);
    let state = Arc::new(api::handlers::ServerState {
        store,
        config: Arc::new(config.clone()),
    });
    let app = api::create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("SWAPRO sync server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
