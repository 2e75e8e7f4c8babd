//! Error types for precache
//!
//! All modules use `PrecacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for precache operations
pub type PrecacheResult<T> = Result<T, PrecacheError>;

/// All errors that can occur in precache
#[derive(Error, Debug)]
pub enum PrecacheError {
    // Lifecycle errors
    #[error("App shell precache aborted: {url}: {reason}")]
    StartupAbort { url: String, reason: String },

    #[error("Worker cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },

    // Network errors
    #[error("Network request failed: {url}: {reason}")]
    NetworkUnavailable { url: String, reason: String },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported request method: {0}")]
    UnsupportedMethod(String),

    // Cache store errors
    #[error("Cache partition not found: {0}")]
    PartitionNotFound(String),

    #[error("Failed to write cache partition {name}: {reason}")]
    PartitionWrite { name: String, reason: String },

    #[error("Corrupt cache partition file {path}: {reason}")]
    PartitionCorrupt { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrecacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a URL parse error for the given input
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Create a network failure error
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NetworkUnavailable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::StartupAbort { .. } => {
                Some("Check that every entry in [shell].assets is reachable from [scope].url")
            }
            Self::InvalidState { state, .. } if state == "installing" || state == "activating" => {
                Some("Another install or activate is still running; retry once it finishes")
            }
            Self::InvalidState { .. } => Some("Run: precache install"),
            Self::PartitionCorrupt { .. } => Some("Remove the file and run: precache install"),
            Self::ConfigInvalid { .. } => Some("Run: precache config init --force"),
            _ => None,
        }
    }
}
