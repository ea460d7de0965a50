//! Platform adapter port
//!
//! A [`PlatformAdapter`] knows how to open a session with one platform's tool
//! server; the resulting [`PlatformConnection`] translates `search(keyword)`
//! into the platform's tool call and normalizes the response.

use async_trait::async_trait;
use scout_domain::{OutcomeStatus, PlatformName, PlatformSpec, ResearchPayload};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors reported by platform adapters and connections
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Platform disabled: {0}")]
    Disabled(String),

    #[error("No adapter registered for platform '{0}'")]
    NoAdapter(String),

    #[error("Failed to start platform server: {0}")]
    Spawn(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection closed")]
    Closed,
}

impl AdapterError {
    /// Outcome status a search failure maps to.
    pub fn outcome_status(&self) -> OutcomeStatus {
        match self {
            AdapterError::Timeout(_) => OutcomeStatus::Timeout,
            AdapterError::Closed | AdapterError::Disabled(_) | AdapterError::NoAdapter(_) => {
                OutcomeStatus::PlatformUnavailable
            }
            AdapterError::Spawn(_) | AdapterError::Handshake(_) | AdapterError::Protocol(_) => {
                OutcomeStatus::ProtocolError
            }
        }
    }
}

/// Opens connections to one platform.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Platform this adapter serves.
    fn platform(&self) -> &PlatformName;

    /// Start the tool server and complete the handshake.
    ///
    /// The caller bounds this with the spec's `init_timeout`; dropping the
    /// future must release whatever was started.
    async fn connect(&self, spec: &PlatformSpec)
    -> Result<Arc<dyn PlatformConnection>, AdapterError>;
}

/// A live session with a platform's tool server.
#[async_trait]
pub trait PlatformConnection: Send + Sync {
    fn platform(&self) -> &PlatformName;

    /// Search `keyword`, giving up at `deadline`.
    async fn search(&self, keyword: &str, deadline: Instant)
    -> Result<ResearchPayload, AdapterError>;

    /// Shut the session down. In-flight searches fail with
    /// [`AdapterError::Closed`].
    async fn close(&self) -> Result<(), AdapterError>;
}
