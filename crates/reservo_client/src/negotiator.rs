// --- File: crates/reservo_client/src/negotiator.rs ---
//! Client side of the slot hold protocol.
//!
//! A negotiator owns at most one hold at a time. Picking another slot
//! releases the previous one first; changing the date or closing the picker
//! releases it too, with the server's hold TTL as the backstop.
//!
//! Every date change, selection and close bumps a generation counter. A
//! response that arrives for an older generation is dropped, and a hold that
//! succeeded for an older generation is released again right away.

use crate::api::{HoldReceipt, Slot, SlotApi, SlotRequest, SlotStatus};
use crate::error::ClientError;
use crate::preferences::PreferenceStore;
use crate::session::SessionId;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Holding,
}

/// What a picker renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerState {
    pub date: Option<NaiveDate>,
    pub slots: Vec<Slot>,
    /// Time this session currently holds.
    pub selected: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub phase: Phase,
    pub last_error: Option<ClientError>,
}

impl Default for PickerState {
    fn default() -> Self {
        Self {
            date: None,
            slots: Vec::new(),
            selected: None,
            expires_at: None,
            phase: Phase::Idle,
            last_error: None,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: PickerState,
    generation: u64,
}

pub struct HoldNegotiator<A: SlotApi> {
    api: Arc<A>,
    session: SessionId,
    preferences: PreferenceStore,
    inner: Mutex<Inner>,
}

impl<A: SlotApi> HoldNegotiator<A> {
    pub fn new(api: Arc<A>, session: SessionId, preferences: PreferenceStore) -> Self {
        Self {
            api,
            session,
            preferences,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    pub fn snapshot(&self) -> PickerState {
        self.inner().state.clone()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request(&self, date: NaiveDate, time: &str) -> SlotRequest {
        SlotRequest {
            date,
            time: time.to_string(),
            session_id: self.session.as_str().to_string(),
            locale: self.preferences.locale(),
        }
    }

    /// Best-effort release. Failures are logged; the server TTL cleans up.
    async fn release_quietly(&self, date: NaiveDate, time: &str) {
        match self.api.release(self.request(date, time)).await {
            Ok(()) => debug!(session_id = %self.session, "released {} {}", date, time),
            Err(e) => warn!(session_id = %self.session, "release of {} {} failed: {}", date, time, e),
        }
    }

    /// Opens the picker on `date` and loads its slots.
    pub async fn open(&self, date: NaiveDate) -> Result<Vec<Slot>, ClientError> {
        self.change_date(date).await
    }

    /// Reloads slots for the current date. A response that arrives after
    /// the date changed is discarded.
    pub async fn refresh(&self) -> Result<Vec<Slot>, ClientError> {
        let (date, generation, selected_before) = {
            let mut inner = self.inner();
            let date = inner.state.date.ok_or(ClientError::NotOpen)?;
            if inner.state.phase == Phase::Idle {
                inner.state.phase = Phase::Fetching;
            }
            (date, inner.generation, inner.state.selected.clone())
        };

        let result = self.api.list_slots(date, self.session.as_str().to_string()).await;

        let mut inner = self.inner();
        if inner.generation != generation {
            debug!("dropping slot list for {} from generation {}", date, generation);
            return Err(ClientError::Superseded);
        }
        if inner.state.phase == Phase::Fetching {
            inner.state.phase = Phase::Idle;
        }
        match result {
            Ok(slots) => {
                // A hold the server no longer reports as ours has expired.
                if let Some(selected) = selected_before.filter(|s| inner.state.selected.as_ref() == Some(s)) {
                    let still_mine = slots.iter().any(|s| s.time == selected && s.mine);
                    if !still_mine {
                        info!(session_id = %self.session, "hold on {} {} lapsed", date, selected);
                        inner.state.selected = None;
                        inner.state.expires_at = None;
                    }
                }
                inner.state.slots = slots.clone();
                Ok(slots)
            }
            Err(e) => {
                inner.state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Holds `time` on the current date, releasing any other slot this
    /// session holds first.
    ///
    /// A rejected hold clears the selection, records the error and reloads
    /// the slots so the picker shows who has it.
    pub async fn select(&self, time: &str) -> Result<HoldReceipt, ClientError> {
        let (date, previous, generation) = {
            let mut inner = self.inner();
            let date = inner.state.date.ok_or(ClientError::NotOpen)?;
            inner.generation += 1;
            let previous = inner.state.selected.take().filter(|p| p != time);
            inner.state.expires_at = None;
            inner.state.phase = Phase::Holding;
            inner.state.last_error = None;
            (date, previous, inner.generation)
        };

        if let Some(previous) = previous {
            self.release_quietly(date, &previous).await;
        }

        let result = self.api.hold(self.request(date, time)).await;

        let stale = {
            let mut inner = self.inner();
            if inner.generation != generation {
                true
            } else {
                inner.state.phase = Phase::Idle;
                match &result {
                    Ok(receipt) => {
                        inner.state.selected = Some(time.to_string());
                        inner.state.expires_at = receipt.expires_at;
                        for slot in inner.state.slots.iter_mut() {
                            if slot.time == time {
                                slot.status = SlotStatus::Available;
                                slot.mine = true;
                            } else {
                                slot.mine = false;
                            }
                        }
                    }
                    Err(e) => inner.state.last_error = Some(e.clone()),
                }
                false
            }
        };

        if stale {
            if result.is_ok() {
                info!(session_id = %self.session, "late hold on {} {}, releasing", date, time);
                self.release_quietly(date, time).await;
            }
            return Err(ClientError::Superseded);
        }

        match result {
            Ok(receipt) => {
                info!(session_id = %self.session, "holding {} {}", date, time);
                Ok(receipt)
            }
            Err(e) => {
                warn!(session_id = %self.session, "hold on {} {} rejected: {}", date, time, e);
                if let Err(refresh_err) = self.refresh().await {
                    debug!("refetch after rejected hold failed: {}", refresh_err);
                }
                Err(e)
            }
        }
    }

    /// Switches to another date, releasing the current hold, and loads its slots.
    pub async fn change_date(&self, date: NaiveDate) -> Result<Vec<Slot>, ClientError> {
        let released = {
            let mut inner = self.inner();
            inner.generation += 1;
            let previous_date = inner.state.date.replace(date);
            let previous = inner.state.selected.take();
            inner.state.slots.clear();
            inner.state.expires_at = None;
            inner.state.phase = Phase::Idle;
            inner.state.last_error = None;
            previous_date.zip(previous)
        };

        if let Some((previous_date, previous)) = released {
            self.release_quietly(previous_date, &previous).await;
        }
        self.refresh().await
    }

    /// Tears the picker down, releasing the current hold.
    pub async fn close(&self) {
        let released = {
            let mut inner = self.inner();
            inner.generation += 1;
            let date = inner.state.date.take();
            let selected = inner.state.selected.take();
            inner.state = PickerState::default();
            date.zip(selected)
        };

        if let Some((date, time)) = released {
            self.release_quietly(date, &time).await;
        }
        debug!(session_id = %self.session, "picker closed");
    }
}
