//! # Node Configuration
//!
//! Unified configuration for every party started by this runtime.
//!
//! Load order: TOML file (or defaults), then `LA_*` environment overrides,
//! then `validate()`.
//!
//! ```toml
//! [network]
//! mailbox_capacity = 1000
//!
//! [[network.parties]]
//! name = "PartyA"
//!
//! [[network.parties]]
//! name = "PartyB"
//! address = "mem://PartyB"
//!
//! [protocol]
//! deadline_ms = 5000
//! staged_ttl_ms = 30000
//!
//! [storage]
//! backend = "file"
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! json_logs = false
//! ```

use la_03_agreement::AgreementConfig;
use serde::{Deserialize, Serialize};
use shared_types::{NetworkAddress, Party, PartyName, TypeTag};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Agreement protocol configuration.
    pub protocol: ProtocolConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Load from `path` (defaults when `None`), apply environment overrides
    /// and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file. Not validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML. Missing sections and keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `LA_*` overrides from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `LA_LOG_LEVEL`: log filter (default: info)
    /// - `LA_JSON_LOGS`: `true`/`1` for JSON logs
    /// - `LA_DEADLINE_MS`: default agreement deadline
    /// - `LA_DATA_DIR`: journal directory
    /// - `LA_STORAGE`: `memory` or `file`
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LA_JSON_LOGS") {
            self.logging.json_logs = json.eq_ignore_ascii_case("true") || json == "1";
        }
        if let Some(deadline) = lookup("LA_DEADLINE_MS") {
            self.protocol.deadline_ms =
                deadline
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "LA_DEADLINE_MS".to_string(),
                        value: deadline.clone(),
                    })?;
        }
        if let Some(dir) = lookup("LA_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("LA_STORAGE") {
            self.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "file" => StorageBackend::File,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "LA_STORAGE".to_string(),
                        value: backend,
                    })
                }
            };
        }
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.parties.len() < 2 {
            return Err(ConfigError::Invalid(
                "at least 2 parties must be configured".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for entry in &self.network.parties {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Invalid("party name is empty".to_string()));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "party {} configured twice",
                    entry.name
                )));
            }
        }
        if self.network.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid(
                "network.mailbox_capacity must be > 0".to_string(),
            ));
        }
        if self.protocol.deadline_ms == 0 {
            return Err(ConfigError::Invalid(
                "protocol.deadline_ms must be > 0".to_string(),
            ));
        }
        if self.protocol.staged_ttl_ms < self.protocol.deadline_ms {
            return Err(ConfigError::Invalid(
                "protocol.staged_ttl_ms must be >= protocol.deadline_ms".to_string(),
            ));
        }
        if self.protocol.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "protocol.max_payload_bytes must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    /// Config file is not valid TOML for `NodeConfig`.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// An override could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// Values parse but contradict each other.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Network configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Parties on the network map. The first two run the demo agreement.
    pub parties: Vec<PartyEntry>,
    /// Deliveries buffered per mailbox.
    pub mailbox_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            parties: vec![PartyEntry::new("PartyA"), PartyEntry::new("PartyB")],
            mailbox_capacity: shared_channel::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// One network map entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyEntry {
    pub name: String,
    /// Defaults to `mem://<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl PartyEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }

    pub fn to_party(&self) -> Party {
        let name = PartyName::new(self.name.clone());
        let address = match &self.address {
            Some(address) => NetworkAddress::new(address.clone()),
            None => NetworkAddress::in_memory(&name),
        };
        Party::new(name, address)
    }
}

/// Agreement protocol configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Default deadline for one agreement.
    pub deadline_ms: u64,
    /// How long counterparties keep accepted, uncommitted proposals.
    pub staged_ttl_ms: u64,
    /// Largest payload accepted.
    pub max_payload_bytes: usize,
    /// Deadline for best-effort abort notices.
    pub abort_timeout_ms: u64,
    /// Type tag for drafted records.
    pub state_type: String,
    /// Finished agreements kept for status lookups.
    pub retained_sessions: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        let defaults = AgreementConfig::default();
        Self {
            deadline_ms: defaults.default_deadline.as_millis() as u64,
            staged_ttl_ms: defaults.staged_ttl.as_millis() as u64,
            max_payload_bytes: defaults.max_payload_bytes,
            abort_timeout_ms: defaults.abort_timeout.as_millis() as u64,
            state_type: TypeTag::SHARED_STATE_RECORD.to_string(),
            retained_sessions: defaults.retained_sessions,
        }
    }
}

impl ProtocolConfig {
    pub fn to_agreement_config(&self) -> AgreementConfig {
        AgreementConfig {
            default_deadline: Duration::from_millis(self.deadline_ms),
            staged_ttl: Duration::from_millis(self.staged_ttl_ms),
            max_payload_bytes: self.max_payload_bytes,
            abort_timeout: Duration::from_millis(self.abort_timeout_ms),
            state_type: TypeTag::new(self.state_type.clone()),
            retained_sessions: self.retained_sessions,
        }
    }
}

/// Where parties keep their records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root of the per-party journal directories.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl StorageConfig {
    /// Journal file of `party`.
    pub fn journal_path(&self, party: &PartyName) -> PathBuf {
        self.data_dir.join(party.as_str()).join("journal.jsonl")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, used when `RUST_LOG` is unset.
    pub level: String,
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_logs: false,
        }
    }
}
