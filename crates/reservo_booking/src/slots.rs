// --- File: crates/reservo_booking/src/slots.rs ---
use crate::overlap::{format_time_of_day, parse_time_of_day, TimeParseError};
use reservo_config::BookingConfig;
use serde::{Deserialize, Serialize};

/// The times of day offered for booking, in `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGrid {
    times: Vec<u32>,
}

impl SlotGrid {
    /// Every `interval` minutes from `opening` up to and including `last_seating`.
    pub fn new(opening: u32, last_seating: u32, interval: u32) -> Self {
        let interval = interval.max(1);
        let times = (opening..=last_seating).step_by(interval as usize).collect();
        Self { times }
    }

    pub fn from_config(booking: &BookingConfig) -> Result<Self, TimeParseError> {
        let opening = parse_time_of_day(&booking.opening_time)?;
        let last_seating = parse_time_of_day(&booking.last_seating_time)?;
        Ok(Self::new(opening, last_seating, booking.slot_interval_minutes))
    }

    pub fn minutes(&self) -> &[u32] {
        &self.times
    }

    pub fn times(&self) -> impl Iterator<Item = String> + '_ {
        self.times.iter().copied().map(format_time_of_day)
    }

    pub fn contains(&self, minutes: u32) -> bool {
        self.times.binary_search(&minutes).is_ok()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// `"18:00-19:30"` for a slot starting at 18:00 with 90 minutes of service.
pub fn slot_label(start: u32, service_minutes: u32) -> String {
    format!(
        "{}-{}",
        format_time_of_day(start),
        format_time_of_day(start + service_minutes)
    )
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
    Held,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[cfg_attr(feature = "openapi", schema(example = "18:00"))]
    pub time: String,
    #[cfg_attr(feature = "openapi", schema(example = "18:00-19:30"))]
    pub label: String,
    pub status: SlotStatus,
    /// The requesting session owns the hold on this slot.
    #[serde(default)]
    pub mine: bool,
}
