//! Configuration schema for precache
//!
//! Configuration is stored at `~/.config/precache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Origin the worker is installed for
    pub scope: ScopeConfig,

    /// Partition naming
    pub caches: CachesConfig,

    /// App shell manifest and offline fallback
    pub shell: ShellConfig,

    /// Outbound HTTP settings
    pub network: NetworkConfig,

    /// Partition store backend
    pub store: StoreConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable the lifecycle journal
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Scope settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Base URL; relative manifest entries and the fallback path resolve against it
    pub url: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/".to_string(),
        }
    }
}

/// Partition naming settings
///
/// Partition names are `{prefix}-{version}`. Bumping `version` orphans every
/// partition of the previous generation; they are removed on the next activate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CachesConfig {
    /// Generation tag appended to both partition names
    pub version: String,

    /// Prefix of the app shell partition
    pub shell_prefix: String,

    /// Prefix of the dynamic partition
    pub dynamic_prefix: String,
}

impl Default for CachesConfig {
    fn default() -> Self {
        Self {
            version: "v4".to_string(),
            shell_prefix: "app-shell".to_string(),
            dynamic_prefix: "dynamic-resources".to_string(),
        }
    }
}

/// App shell settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Assets precached on install (paths or absolute URLs), in order
    pub assets: Vec<String>,

    /// Document served when a dynamic request cannot reach the network
    pub offline_fallback: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            assets: vec![
                "./".to_string(),
                "index.html".to_string(),
                "main.js".to_string(),
            ],
            offline_fallback: "/home.html".to_string(),
        }
    }
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Global request timeout in seconds (0 = none)
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Largest response body read, in bytes (0 = no limit)
    pub max_body_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("precache/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Which partition store backs the worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON documents under the state directory
    #[default]
    Disk,
    /// Process-local, lost on exit
    Memory,
}

/// Partition store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend kind
    pub backend: StoreBackend,

    /// Directory for the disk backend (defaults to the state directory)
    pub path: Option<PathBuf>,
}
