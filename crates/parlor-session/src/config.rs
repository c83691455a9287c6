//! Registry configuration and the session lifecycle state machine.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`SessionRegistry`](crate::SessionRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// A session with no activity for longer than this is swept.
    pub idle_timeout: Duration,

    /// How often the server runs the sweep.
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle of a session.
///
/// ```text
/// Waiting ──(start)──→ Playing ──(decided)──→ Finished
///                         ↑                      │
///                         └──────(reset)─────────┘
/// ```
///
/// Forward transitions only, except reset, which may be issued from
/// either `Playing` or `Finished` and lands on `Playing` with a fresh game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Waiting,
    Playing,
    Finished,
}

impl SessionState {
    /// Returns `true` if the session still accepts new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` while a game is in progress.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}
