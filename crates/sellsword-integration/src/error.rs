use thiserror::Error;

use sellsword_combat::CombatError;

/// Failures of a [`BattleStore`](crate::store::BattleStore) operation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Store is offline or unreachable")]
    Offline,

    #[error("Request timed out")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Io(String),

    #[error("Injected failure: {0}")]
    Injected(String),
}

impl StoreError {
    /// Whether trying the same call again could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Network(_)
            | StoreError::Offline
            | StoreError::Timeout
            | StoreError::Io(_)
            | StoreError::Injected(_) => true,
            StoreError::ServerError { status, .. } => *status >= 500 || *status == 429,
            StoreError::AuthFailed(_) | StoreError::Serialization(_) | StoreError::NotFound(_) => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Offline
        } else if err.is_decode() {
            StoreError::Serialization(err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Failures surfaced by the battle runner
#[derive(Debug, Error)]
pub enum BattleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Combat(#[from] CombatError),

    /// Some reward writes still failed after retrying. The plan stays
    /// pending on the session.
    #[error("Reward commit failed for: {}", failed.join(", "))]
    RewardCommit { failed: Vec<String> },
}
