// --- File: crates/reservo_booking/src/overlap.rs ---
//! Conflict detection between two bookings on the same table.
//!
//! Times are compared as minutes since midnight. Two rules exist because the
//! guest wizard and the single page form were built with different notions of
//! "overlap"; which one the server enforces is a configuration decision
//! (`booking.conflict_flow`), never a silent merge.

use crate::models::Reservation;
use reservo_config::{BookingFlow, OverlapConfig};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("malformed time of day: {0:?}")]
    Malformed(String),
    #[error("time of day out of range: {0:?}")]
    OutOfRange(String),
}

/// Parses `HH:MM` or `HH:MM:SS` into minutes since midnight. Seconds are ignored.
pub fn parse_time_of_day(value: &str) -> Result<u32, TimeParseError> {
    let malformed = || TimeParseError::Malformed(value.to_string());
    let trimmed = value.trim();
    let mut parts = trimmed.split(':');

    let hours = parts.next().ok_or_else(malformed)?;
    let minutes = parts.next().ok_or_else(malformed)?;
    let seconds = parts.next();
    if parts.next().is_some() {
        return Err(malformed());
    }

    let is_number = |s: &str, min_len: usize, max_len: usize| {
        (min_len..=max_len).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !is_number(hours, 1, 2) || !is_number(minutes, 2, 2) {
        return Err(malformed());
    }
    if let Some(seconds) = seconds {
        if !is_number(seconds, 2, 2) {
            return Err(malformed());
        }
        if seconds.parse::<u32>().map_err(|_| malformed())? >= 60 {
            return Err(TimeParseError::OutOfRange(value.to_string()));
        }
    }

    let hours: u32 = hours.parse().map_err(|_| malformed())?;
    let minutes: u32 = minutes.parse().map_err(|_| malformed())?;
    if hours >= 24 || minutes >= 60 {
        return Err(TimeParseError::OutOfRange(value.to_string()));
    }
    Ok(hours * 60 + minutes)
}

/// Formats minutes since midnight as `HH:MM`.
pub fn format_time_of_day(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Normalizes a parseable time to `HH:MM`.
pub fn normalize_time_of_day(value: &str) -> Result<String, TimeParseError> {
    parse_time_of_day(value).map(format_time_of_day)
}

/// A conflict predicate over two booking start times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapRule {
    /// Wizard flow: both bookings occupy `[start, start + duration + buffer)`
    /// and conflict when those half-open windows intersect.
    Interval { duration: u32, buffer: u32 },
    /// Single page form flow: conflict when the start times are closer than
    /// `window` minutes (buffer already folded into the window).
    Proximity { window: u32 },
}

impl OverlapRule {
    pub fn for_flow(flow: BookingFlow, overlap: &OverlapConfig) -> Self {
        match flow {
            BookingFlow::Wizard => OverlapRule::Interval {
                duration: overlap.wizard.duration_minutes,
                buffer: overlap.wizard.buffer_minutes,
            },
            BookingFlow::Form => OverlapRule::Proximity {
                window: overlap.form.window_minutes,
            },
        }
    }

    /// Minutes a booking blocks its table under this rule.
    pub fn occupied_minutes(&self) -> u32 {
        match *self {
            OverlapRule::Interval { duration, buffer } => duration + buffer,
            OverlapRule::Proximity { window } => window,
        }
    }

    /// Minutes the guest is actually seated, used for slot labels.
    pub fn service_minutes(&self) -> u32 {
        match *self {
            OverlapRule::Interval { duration, .. } => duration,
            OverlapRule::Proximity { window } => window,
        }
    }

    /// Conflict test on already-parsed start times.
    pub fn conflicts_at(&self, candidate: u32, existing: u32) -> bool {
        match *self {
            OverlapRule::Interval { .. } => {
                let window = self.occupied_minutes();
                let (selected_start, selected_end) = (candidate, candidate + window);
                let (other_start, other_end) = (existing, existing + window);
                selected_start < other_end && selected_end > other_start
            }
            OverlapRule::Proximity { window } => candidate.abs_diff(existing) < window,
        }
    }

    /// Conflict test on raw time strings. Unparseable input counts as a conflict.
    pub fn conflicts(&self, candidate: &str, existing: &str) -> bool {
        match (parse_time_of_day(candidate), parse_time_of_day(existing)) {
            (Ok(candidate), Ok(existing)) => self.conflicts_at(candidate, existing),
            (Err(e), _) | (_, Err(e)) => {
                debug!("treating unparseable time as conflicting: {}", e);
                true
            }
        }
    }
}

/// Table numbers that should be shown as booked for `candidate_time`.
///
/// Only `pending` and `confirmed` reservations with a table number count.
/// The caller is responsible for passing reservations of a single date.
pub fn booked_tables<'a, I>(candidate_time: &str, reservations: I, rule: OverlapRule) -> BTreeSet<u32>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    reservations
        .into_iter()
        .filter(|r| r.status.is_active())
        .filter_map(|r| r.table_number.map(|table| (table, r)))
        .filter(|(_, r)| rule.conflicts(candidate_time, &r.reservation_time))
        .map(|(table, _)| table)
        .collect()
}
