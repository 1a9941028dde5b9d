// --- File: crates/reservo_booking/src/lib.rs ---
pub mod changes;
pub mod clock;
pub mod doc;
pub mod handlers;
pub mod holds;
pub mod models;
pub mod overlap;
#[cfg(test)]
mod overlap_proptest;
pub mod routes;
pub mod service;
#[cfg(test)]
mod service_test;
pub mod slots;
pub mod sweeper;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use service::BookingService;
