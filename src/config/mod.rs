use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// Complete relay configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub users: UsersConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Broadcast hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Capacity of each connection's outbound queue. When full, new messages
    /// for that connection are dropped.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

fn default_outbound_buffer() -> usize {
    256
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

/// User records API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// SQLite database file for user records
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Maximum accepted JSON request body
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_database_path() -> String {
    "users.db".to_string()
}

fn default_body_limit() -> usize {
    102_400 // 100 KiB
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl RelayConfig {
    /// Build from `RELAY_CONFIG` (if set) and env overrides, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match std::env::var("RELAY_CONFIG") {
            Ok(path) => load_config(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Apply overrides from a key lookup. Values that fail to parse are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RELAY_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %v, "Ignoring invalid PORT"),
            }
        }
        if let Some(v) = lookup("RELAY_DATABASE_PATH") {
            self.users.database_path = v;
        }
        if let Some(v) = lookup("RELAY_OUTBOUND_BUFFER") {
            match v.parse::<usize>() {
                Ok(n) if n > 0 => self.hub.outbound_buffer = n,
                _ => warn!(value = %v, "Ignoring invalid RELAY_OUTBOUND_BUFFER"),
            }
        }
        if let Some(v) = lookup("RELAY_BODY_LIMIT_BYTES") {
            match v.parse::<usize>() {
                Ok(n) => self.users.body_limit_bytes = n,
                Err(_) => warn!(value = %v, "Ignoring invalid RELAY_BODY_LIMIT_BYTES"),
            }
        }
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<RelayConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: RelayConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}
