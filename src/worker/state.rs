//! Worker state persistence

use crate::error::{PrecacheError, PrecacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// Lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; a fresh install is required
    Redundant,
}

impl WorkerState {
    pub fn can_install(&self) -> bool {
        !matches!(self, Self::Installing | Self::Activating)
    }

    pub fn can_activate(&self) -> bool {
        matches!(self, Self::Installed | Self::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", s)
    }
}

/// Persistent record of one worker generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Registration id
    pub id: Uuid,

    /// Cache version this worker owns
    pub version: String,

    pub state: WorkerState,

    /// Set once install succeeds: take over loading clients without waiting
    pub skip_waiting: bool,

    /// Clients claimed by the last activation
    pub claimed: usize,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub installed_at: Option<DateTime<Utc>>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl WorkerRecord {
    pub fn new(version: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            version: version.to_string(),
            state: WorkerState::Parsed,
            skip_waiting: false,
            claimed: 0,
            created_at: now,
            updated_at: now,
            installed_at: None,
            activated_at: None,
        }
    }

    /// Move to a new state and stamp the transition
    pub fn transition(&mut self, state: WorkerState) {
        let now = Utc::now();
        match state {
            WorkerState::Installed => {
                self.installed_at = Some(now);
                self.skip_waiting = true;
            }
            WorkerState::Activated => self.activated_at = Some(now),
            _ => {}
        }
        self.state = state;
        self.updated_at = now;
    }

    /// Settle a record left mid-transition by a process that exited
    ///
    /// An interrupted install leaves nothing usable behind, so the record goes
    /// back to `Parsed`. An interrupted activate falls back to the last state
    /// activate was entered from. Returns the abandoned state, if any.
    pub fn recover(&mut self) -> Option<WorkerState> {
        let settled = match self.state {
            WorkerState::Installing => WorkerState::Parsed,
            WorkerState::Activating if self.activated_at.is_some() => WorkerState::Activated,
            WorkerState::Activating => WorkerState::Installed,
            _ => return None,
        };
        let abandoned = self.state;
        self.state = settled;
        self.updated_at = Utc::now();
        Some(abandoned)
    }

    /// Load a record from file
    pub async fn load(path: &Path) -> PrecacheResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PrecacheError::io(format!("reading worker state {}", path.display()), e))?;

        let record: WorkerRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    /// Save the record to file
    pub async fn save(&self, path: &Path) -> PrecacheResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PrecacheError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| PrecacheError::io(format!("writing worker state {}", path.display()), e))?;

        Ok(())
    }
}
