// crates/veilcraft-daemon/src/config.rs
//
// Runtime configuration for the Veilcraft daemon.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use veilcraft_coordinator::CoordinatorConfig;
use veilcraft_core::crypto::Keypair;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Initial owner, as a 0x-prefixed hex address or a label to derive one from.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Simulated oracle latency before each decryption is answered.
    #[serde(default = "default_oracle_delay_ms")]
    pub oracle_delay_ms: u64,

    /// Hex-encoded 32-byte ed25519 seed for the oracle key.
    /// A fresh key is generated when absent.
    #[serde(default)]
    pub oracle_seed: Option<String>,

    /// How long to wait for outstanding callbacks after the call log is replayed.
    #[serde(default = "default_callback_timeout_ms")]
    pub callback_timeout_ms: u64,

    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_owner() -> String {
    "owner".to_string()
}

fn default_oracle_delay_ms() -> u64 {
    50
}

fn default_callback_timeout_ms() -> u64 {
    5_000
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            owner: default_owner(),
            oracle_delay_ms: default_oracle_delay_ms(),
            oracle_seed: None,
            callback_timeout_ms: default_callback_timeout_ms(),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Build the oracle signing key from `oracle_seed`, or generate one.
    pub fn oracle_keypair(&self) -> Result<Keypair, Box<dyn std::error::Error>> {
        match &self.oracle_seed {
            Some(seed_hex) => {
                let bytes = hex::decode(seed_hex.trim().trim_start_matches("0x"))?;
                let seed: [u8; 32] = bytes
                    .try_into()
                    .map_err(|b: Vec<u8>| format!("oracle_seed must be 32 bytes, got {}", b.len()))?;
                Ok(Keypair::from_seed(&seed))
            }
            None => Ok(Keypair::generate()),
        }
    }
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
