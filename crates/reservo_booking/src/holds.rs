// --- File: crates/reservo_booking/src/holds.rs ---
//! Session-scoped soft locks on `(date, time)` slots.
//!
//! The registry is the authoritative record of who is in the middle of
//! booking which slot. It is not synchronized on its own; the booking service
//! keeps it under the same lock as the reservation ledger so that a hold check
//! and a reservation insert are one atomic step.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use reservo_common::HoldFailure;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: NaiveDate,
    /// `HH:MM`
    pub time: String,
}

impl SlotKey {
    pub fn new(date: NaiveDate, time: impl Into<String>) -> Self {
        Self {
            date,
            time: time.into(),
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug)]
pub struct HoldRegistry {
    holds: HashMap<SlotKey, Hold>,
    ttl: Duration,
}

impl HoldRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            holds: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Claims `key` for `session_id`.
    ///
    /// Re-holding by the owner extends the expiry. A live hold owned by anyone
    /// else is left untouched and the call fails with `SlotHeld`.
    pub fn hold(&mut self, key: SlotKey, session_id: &str, now: DateTime<Utc>) -> Result<Hold, HoldFailure> {
        if let Some(existing) = self.holds.get_mut(&key) {
            if !existing.is_expired(now) {
                if existing.session_id != session_id {
                    return Err(HoldFailure::SlotHeld);
                }
                existing.expires_at = now + self.ttl;
                debug!(date = %key.date, time = %key.time, session_id, "hold refreshed");
                return Ok(existing.clone());
            }
        }

        let hold = Hold {
            session_id: session_id.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        debug!(date = %key.date, time = %key.time, session_id, "hold acquired");
        self.holds.insert(key, hold.clone());
        Ok(hold)
    }

    /// Drops the hold on `key` if `session_id` owns it.
    ///
    /// Returns `Ok(false)` when there was nothing live to release, and
    /// `NotHolder` when the live hold belongs to another session.
    pub fn release(&mut self, key: &SlotKey, session_id: &str, now: DateTime<Utc>) -> Result<bool, HoldFailure> {
        match self.holds.get(key) {
            None => Ok(false),
            Some(hold) if hold.is_expired(now) => {
                self.holds.remove(key);
                Ok(false)
            }
            Some(hold) if hold.session_id != session_id => Err(HoldFailure::NotHolder),
            Some(_) => {
                self.holds.remove(key);
                debug!(date = %key.date, time = %key.time, session_id, "hold released");
                Ok(true)
            }
        }
    }

    /// The live hold on `key`, if any.
    pub fn holder(&self, key: &SlotKey, now: DateTime<Utc>) -> Option<&Hold> {
        self.holds.get(key).filter(|hold| !hold.is_expired(now))
    }

    /// Removes the hold on `key` when it belongs to `session_id`, expired or not.
    /// Called once the session's reservation has been written.
    pub fn consume(&mut self, key: &SlotKey, session_id: &str) -> bool {
        match self.holds.get(key) {
            Some(hold) if hold.session_id == session_id => {
                self.holds.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Drops every expired hold and returns their keys.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<SlotKey> {
        let expired: Vec<SlotKey> = self
            .holds
            .iter()
            .filter(|(_, hold)| hold.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.holds.remove(key);
        }
        expired
    }

    /// Drops every hold owned by `session_id` and returns their keys.
    pub fn release_session(&mut self, session_id: &str) -> Vec<SlotKey> {
        let owned: Vec<SlotKey> = self
            .holds
            .iter()
            .filter(|(_, hold)| hold.session_id == session_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &owned {
            self.holds.remove(key);
        }
        owned
    }

    pub fn len(&self) -> usize {
        self.holds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }
}
