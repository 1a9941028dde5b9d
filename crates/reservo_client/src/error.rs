// --- File: crates/reservo_client/src/error.rs ---
use reservo_common::{ErrorBody, HoldFailure};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server refused a hold or a submission for a known reason.
    #[error("{0}")]
    Hold(HoldFailure),

    /// Any other non-2xx answer.
    #[error("Request rejected ({status}, {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Request timed out")]
    Timeout,

    /// The picker moved on (date change, close, newer selection) while the
    /// request was in flight; its result was discarded.
    #[error("Superseded by a newer request")]
    Superseded,

    /// An operation needed a date but the picker is not open.
    #[error("No date selected")]
    NotOpen,
}

impl ClientError {
    /// Builds the error for a non-2xx response carrying the server's error body.
    pub fn from_error_body(status: u16, body: ErrorBody) -> Self {
        match serde_json::from_value::<HoldFailure>(serde_json::Value::String(body.code.clone())) {
            Ok(failure) => ClientError::Hold(failure),
            Err(_) => ClientError::Rejected {
                status,
                code: body.code,
                message: body.error,
            },
        }
    }

    pub fn hold_failure(&self) -> Option<HoldFailure> {
        match self {
            ClientError::Hold(failure) => Some(*failure),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}
