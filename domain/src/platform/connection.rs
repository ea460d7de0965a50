//! Connection lifecycle state.
//!
//! ```text
//! Starting ──> Ready ──> Closed
//!     │                    ^
//!     └──> Degraded ───────┘
//! ```

use serde::{Deserialize, Serialize};

/// State of one platform connection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Process spawned, handshake in progress.
    Starting,
    /// Handshake done; the platform takes part in the fan-out.
    Ready,
    /// Handshake failed or timed out after the retry; excluded this cycle.
    Degraded,
    /// Shut down at cycle end.
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Starting => "starting",
            ConnectionState::Ready => "ready",
            ConnectionState::Degraded => "degraded",
            ConnectionState::Closed => "closed",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Starting, Ready) | (Starting, Degraded) | (Ready, Closed) | (Degraded, Closed)
                | (Starting, Closed)
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
