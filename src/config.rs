//! Plugin Configuration
//!
//! Defines the configuration for the attack & defense challenge plugin:
//! - Default defense points awarded per defended round
//! - Contest window (start/end/paused) gating score updates
//! - Optional scoreboard freeze cutoff

use crate::challenge::NewChallenge;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complete plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Default defense points for newly created challenges
    pub defense_point: i64,
    /// Contest window gating the update endpoint
    pub contest: ContestWindow,
    /// Scoreboard freeze: awards at or after this instant are hidden from
    /// team award listings
    pub freeze: Option<DateTime<Utc>>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            defense_point: 5,
            contest: ContestWindow::default(),
            freeze: None,
        }
    }
}

impl PluginConfig {
    /// Challenge creation parameters carrying this config's defaults
    pub fn new_challenge(&self, name: impl Into<String>) -> NewChallenge {
        NewChallenge {
            defense_point: self.defense_point,
            ..NewChallenge::new(name)
        }
    }
}

/// Contest window configuration
///
/// An unset bound means the contest is unbounded on that side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContestWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub paused: bool,
}

/// Phase of the contest at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestPhase {
    NotStarted,
    Running,
    Paused,
    Ended,
}

impl ContestWindow {
    /// Determine the contest phase at `now`.
    ///
    /// Bounds win over the paused flag: a contest that has ended stays
    /// ended even if someone left it paused.
    pub fn phase(&self, now: DateTime<Utc>) -> ContestPhase {
        if let Some(start) = self.start {
            if now < start {
                return ContestPhase::NotStarted;
            }
        }
        if let Some(end) = self.end {
            if now >= end {
                return ContestPhase::Ended;
            }
        }
        if self.paused {
            return ContestPhase::Paused;
        }
        ContestPhase::Running
    }

    /// Whether score updates are accepted at `now`.
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.phase(now) == ContestPhase::Running
    }
}
