//! Error types shared by the sync engine and its callers

use std::time::Duration;
use thiserror::Error;

/// Why a single fetch against an external read-only source failed.
///
/// These never terminate a polling loop; they are retained as the
/// `last_error` of the synced value instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Endpoint unreachable, timed out, or answered with a non-success status
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Read-only call reverted or returned an error value
    #[error("Contract error: {0}")]
    Contract(String),
}

impl FetchError {
    /// Short label for log lines and status bars
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Decode(_) => "decode",
            FetchError::Contract(_) => "contract",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Sync period must be greater than zero (got {0:?})")]
    ZeroPeriod(Duration),
}
