use thiserror::Error;

/// Errors that can occur during sync and session operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network: {0}")]
    Network(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("session already open")]
    SessionAlreadyOpen,
    #[error("no open session")]
    SessionNotOpen,
}

impl SyncError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether local state is still the operative truth after this error.
    /// Network failures degrade to local-only mode; everything else means
    /// the call itself was rejected.
    pub fn is_degradation(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
