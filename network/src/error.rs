//! Stacks API client errors

use naija_core::FetchError;
use thiserror::Error;

use crate::clarity::ClarityError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Clarity decode failed: {0}")]
    Clarity(#[from] ClarityError),

    /// The node refused to evaluate the read-only call (`okay: false`)
    #[error("Contract call rejected: {0}")]
    CallRejected(String),

    /// The contract evaluated to `(err ..)`
    #[error("Contract returned {0}")]
    ContractErr(String),

    #[error("Unexpected value: expected {expected}, got {got}")]
    UnexpectedValue { expected: &'static str, got: String },
}

impl ClientError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        ClientError::Http {
            status,
            body: body.into(),
        }
    }
}

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match err {
            ClientError::Request(e) if e.is_decode() => FetchError::Decode(message),
            ClientError::Request(_) | ClientError::Http { .. } => FetchError::Network(message),
            ClientError::InvalidResponse(_)
            | ClientError::Clarity(_)
            | ClientError::UnexpectedValue { .. } => FetchError::Decode(message),
            ClientError::CallRejected(_) | ClientError::ContractErr(_) => {
                FetchError::Contract(message)
            }
        }
    }
}
