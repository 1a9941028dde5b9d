// --- File: crates/reservo_client/src/lib.rs ---
pub mod api; // SlotApi trait and its reqwest implementation
pub mod error;
pub mod negotiator;
pub mod poller;
pub mod preferences;
pub mod session;

pub use api::{HoldReceipt, HttpSlotApi, Slot, SlotApi, SlotRequest, SlotStatus};
pub use error::ClientError;
pub use negotiator::{HoldNegotiator, Phase, PickerState};
pub use poller::SlotPoller;
pub use preferences::{PreferenceStore, Preferences, Theme};
pub use session::SessionId;
