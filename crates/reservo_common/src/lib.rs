// --- File: crates/reservo_common/src/lib.rs ---

pub mod error; // Error taxonomy shared by server and client
pub mod http; // Error rendering for axum handlers
pub mod logging; // Tracing subscriber bootstrap

pub use error::{
    config_error, conflict, internal_error, not_found, validation_error, HoldFailure,
    HttpStatusCode, ReservoError,
};

pub use http::ErrorBody;

pub use logging::{init, init_from_config, init_with_level, log_result};
