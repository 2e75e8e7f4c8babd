//! Versioned partition names and the activation allow-list

use crate::config::schema::CachesConfig;
use std::collections::HashSet;
use std::fmt;

/// Logical role of a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionRole {
    /// Precached app shell assets
    Shell,
    /// Opportunistically cached network responses
    Dynamic,
}

impl fmt::Display for PartitionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell => write!(f, "shell"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Names of the current-generation partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    pub shell: String,
    pub dynamic: String,
}

impl CacheNames {
    /// Build `{prefix}-{version}` names for both roles
    pub fn new(shell_prefix: &str, dynamic_prefix: &str, version: &str) -> Self {
        Self {
            shell: format!("{}-{}", shell_prefix, version),
            dynamic: format!("{}-{}", dynamic_prefix, version),
        }
    }

    pub fn from_config(config: &CachesConfig) -> Self {
        Self::new(&config.shell_prefix, &config.dynamic_prefix, &config.version)
    }

    /// Name of the current partition for a role
    pub fn for_role(&self, role: PartitionRole) -> &str {
        match role {
            PartitionRole::Shell => &self.shell,
            PartitionRole::Dynamic => &self.dynamic,
        }
    }

    /// Role of a name, if it is one of the current partitions
    pub fn role_of(&self, name: &str) -> Option<PartitionRole> {
        if name == self.shell {
            Some(PartitionRole::Shell)
        } else if name == self.dynamic {
            Some(PartitionRole::Dynamic)
        } else {
            None
        }
    }

    pub fn allow_list(&self) -> AllowList {
        AllowList {
            names: [self.shell.clone(), self.dynamic.clone()].into_iter().collect(),
        }
    }
}

/// Partition names that survive activation
#[derive(Debug, Clone)]
pub struct AllowList {
    names: HashSet<String>,
}

impl AllowList {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Names not on the list, in input order
    ///
    /// Exact set difference: `app-shell-v3` is stale even when `app-shell-v4`
    /// is current, and unrelated names are stale too.
    pub fn stale<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names
            .into_iter()
            .filter(|n| !self.contains(n))
            .cloned()
            .collect()
    }
}
