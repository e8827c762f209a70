//! Preset configurations
//!
//! The only real tradeoff a repository exposes is delete visibility versus
//! commit latency, so presets are named after which side they pick.

use serde::{Deserialize, Serialize};

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Every commit that resolves deletes republishes the snapshot.
    ///
    /// - apply_all_deletes = true
    /// - Deletes are visible as soon as the commit returns
    Consistent,

    /// Delete-only commits skip the reopen.
    ///
    /// - apply_all_deletes = false
    /// - Deletes show up with the next commit that changes segments
    LowLatency,
}

impl Preset {
    pub fn apply_all_deletes(&self) -> bool {
        match self {
            Self::Consistent => true,
            Self::LowLatency => false,
        }
    }

    /// Parse preset from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "consistent" => Ok(Self::Consistent),
            "low_latency" | "low-latency" => Ok(Self::LowLatency),
            _ => Err(format!(
                "Unknown preset '{}'. Valid presets: consistent, low_latency",
                s
            )),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consistent => "consistent",
            Self::LowLatency => "low_latency",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Consistent
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
