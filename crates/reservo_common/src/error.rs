// --- File: crates/reservo_common/src/error.rs ---
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a hold (or a submission racing a hold) was refused.
///
/// Serialized as the `code` field of error bodies so clients can branch on
/// the kind instead of matching message text.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldFailure {
    /// Another session owns an unexpired hold on the slot.
    SlotHeld,
    /// The slot has no free capacity left.
    SlotBooked,
    /// The slot starts in the past.
    SlotInPast,
    /// The slot is not on the grid for that date.
    UnknownSlot,
    /// A release was attempted by a session that does not own the hold.
    #[serde(rename = "hold_not_owned")]
    NotHolder,
}

impl HoldFailure {
    pub fn code(&self) -> &'static str {
        match self {
            HoldFailure::SlotHeld => "slot_held",
            HoldFailure::SlotBooked => "slot_booked",
            HoldFailure::SlotInPast => "slot_in_past",
            HoldFailure::UnknownSlot => "unknown_slot",
            HoldFailure::NotHolder => "hold_not_owned",
        }
    }
}

impl fmt::Display for HoldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            HoldFailure::SlotHeld => "This time slot is being held by another guest",
            HoldFailure::SlotBooked => "This time slot is fully booked",
            HoldFailure::SlotInPast => "This time slot has already passed",
            HoldFailure::UnknownSlot => "This time slot is not offered on that date",
            HoldFailure::NotHolder => "This hold belongs to another session",
        };
        f.write_str(message)
    }
}

/// The base error type shared by the server and the client crates.
#[derive(Error, Debug)]
pub enum ReservoError {
    /// Input failed validation (field formats, party size, unknown status transition).
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    /// A reservation or table conflicts with existing state.
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// A hold could not be taken or released.
    #[error("{0}")]
    HoldError(HoldFailure),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for ReservoError {
    fn status_code(&self) -> u16 {
        match self {
            ReservoError::ValidationError(_) => 400,
            ReservoError::NotFoundError(_) => 404,
            ReservoError::ConflictError(_) => 409,
            ReservoError::HoldError(HoldFailure::UnknownSlot) => 400,
            ReservoError::HoldError(HoldFailure::NotHolder) => 403,
            ReservoError::HoldError(_) => 409,
            ReservoError::ConfigError(_) => 500,
            ReservoError::TimeoutError(_) => 504,
            ReservoError::InternalError(_) => 500,
        }
    }
}

impl ReservoError {
    /// Stable machine-readable code rendered next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            ReservoError::ValidationError(_) => "validation_failed",
            ReservoError::NotFoundError(_) => "not_found",
            ReservoError::ConflictError(_) => "conflict",
            ReservoError::HoldError(failure) => failure.code(),
            ReservoError::ConfigError(_) => "config_error",
            ReservoError::TimeoutError(_) => "timeout",
            ReservoError::InternalError(_) => "internal_error",
        }
    }
}

impl From<HoldFailure> for ReservoError {
    fn from(failure: HoldFailure) -> Self {
        ReservoError::HoldError(failure)
    }
}

impl From<serde_json::Error> for ReservoError {
    fn from(err: serde_json::Error) -> Self {
        ReservoError::ValidationError(err.to_string())
    }
}

pub fn validation_error<T: fmt::Display>(message: T) -> ReservoError {
    ReservoError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> ReservoError {
    ReservoError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> ReservoError {
    ReservoError::ConflictError(message.to_string())
}

pub fn config_error<T: fmt::Display>(message: T) -> ReservoError {
    ReservoError::ConfigError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> ReservoError {
    ReservoError::InternalError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_failures_map_to_conflict_or_client_errors() {
        assert_eq!(ReservoError::from(HoldFailure::SlotHeld).status_code(), 409);
        assert_eq!(ReservoError::from(HoldFailure::SlotBooked).status_code(), 409);
        assert_eq!(ReservoError::from(HoldFailure::UnknownSlot).status_code(), 400);
        assert_eq!(ReservoError::from(HoldFailure::NotHolder).status_code(), 403);
    }

    #[test]
    fn hold_failure_code_matches_serde_name() {
        for failure in [
            HoldFailure::SlotHeld,
            HoldFailure::SlotBooked,
            HoldFailure::SlotInPast,
            HoldFailure::UnknownSlot,
            HoldFailure::NotHolder,
        ] {
            let json = serde_json::to_value(failure).unwrap();
            assert_eq!(json, serde_json::Value::String(failure.code().to_string()));
        }
    }
}
