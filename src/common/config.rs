//! # Configuration Utilities
//!
//! Configuration structures and parsing utilities shared by the library and the
//! `wholesale` binary.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! client pointed at the production backend with a 10-second timeout.
//!
//! # Example TOML
//!
//! ```toml
//! [api]
//! base_url = "https://chwh.store/backend/api"
//! timeout_secs = 10
//! verbose = false
//!
//! [session]
//! path = "/home/alice/.wholesale/session.json"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Production backend origin.
pub const DEFAULT_BASE_URL: &str = "https://chwh.store/backend/api";

/// Request timeout applied to every call unless configured otherwise.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: ApiConfig = load_config("config/wholesale.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend endpoint and request behaviour
    pub api: EndpointConfig,
    /// Where the session token is persisted
    pub session: SessionConfig,
}

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Origin every operation path is appended to (e.g., "https://chwh.store/backend/api")
    pub base_url: String,
    /// Upper bound for a single call, in seconds
    pub timeout_secs: u64,
    /// Emit a trace line for every request and response
    pub verbose: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verbose: false,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding the persisted key-value entries. `None` keeps the session
    /// in memory only.
    pub path: Option<PathBuf>,
}

impl ApiConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML for
    /// this structure, or sets `timeout_secs` to zero.
    pub fn from_file(path: &str) -> Result<Self> {
        let config: Self = load_config(path)?;
        if config.api.timeout_secs == 0 {
            anyhow::bail!("{}: api.timeout_secs must be at least 1", path);
        }
        Ok(config)
    }
}
