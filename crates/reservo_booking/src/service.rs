// --- File: crates/reservo_booking/src/service.rs ---
//! The authoritative booking state: holds, reservations and tables.
//!
//! All three live behind one lock, so "is the slot free, is it held, insert
//! the reservation, consume the hold" happens as a single step. Change events
//! are published after the lock is released.

use crate::changes::{ChangeAction, ChangeEvent, ChangeFeed, Resource, Subscription};
use crate::clock::Clock;
use crate::holds::{Hold, HoldRegistry, SlotKey};
use crate::models::{
    NewReservation, NewTable, Reservation, ReservationStatus, ReservationUpdate, Table,
    TableAvailability, TableUpdate,
};
use crate::overlap::{booked_tables, format_time_of_day, parse_time_of_day, OverlapRule};
use crate::slots::{slot_label, Slot, SlotGrid, SlotStatus};
use crate::validation::{
    non_empty, parse_date, validate_email, validate_guest_name, validate_party_size,
    validate_phone, validate_session_id,
};
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use reservo_common::{
    config_error, conflict, not_found, validation_error, HoldFailure, ReservoError,
};
use reservo_config::{BookingConfig, BookingFlow};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

const BOOKING_CODE_LENGTH: usize = 6;

#[derive(Debug)]
struct Ledger {
    holds: HoldRegistry,
    reservations: HashMap<Uuid, Reservation>,
    tables: BTreeMap<u32, Table>,
    next_table_id: u32,
}

impl Ledger {
    fn active_on(&self, date: NaiveDate) -> impl Iterator<Item = &Reservation> {
        self.reservations
            .values()
            .filter(move |r| r.reservation_date == date && r.status.is_active())
    }

    fn code_taken(&self, code: &str) -> bool {
        self.reservations.values().any(|r| r.booking_code == code)
    }
}

/// Upper bound for `hold_ttl_seconds`.
pub const MAX_HOLD_TTL_SECONDS: u64 = 24 * 60 * 60;

pub struct BookingService {
    config: BookingConfig,
    tz: Tz,
    grid: SlotGrid,
    rule: OverlapRule,
    clock: Arc<dyn Clock>,
    ledger: Mutex<Ledger>,
    changes: ChangeFeed,
}

impl BookingService {
    pub fn new(config: BookingConfig, clock: Arc<dyn Clock>) -> Result<Self, ReservoError> {
        let tz: Tz = config
            .time_zone
            .parse()
            .map_err(|e| config_error(format!("Invalid time zone {:?}: {}", config.time_zone, e)))?;
        let grid = SlotGrid::from_config(&config).map_err(config_error)?;
        if grid.is_empty() {
            return Err(config_error("Slot grid is empty; check opening and last seating times"));
        }
        let rule = OverlapRule::for_flow(config.conflict_flow, &config.overlap);
        if !(1..=MAX_HOLD_TTL_SECONDS).contains(&config.hold_ttl_seconds) {
            return Err(config_error(format!(
                "hold_ttl_seconds must be between 1 and {MAX_HOLD_TTL_SECONDS}, got {}",
                config.hold_ttl_seconds
            )));
        }
        let ttl = Duration::seconds(config.hold_ttl_seconds as i64);

        info!(
            "booking service ready: {} slots, rule {:?}, hold ttl {}s",
            grid.len(),
            rule,
            config.hold_ttl_seconds
        );

        Ok(Self {
            config,
            tz,
            grid,
            rule,
            clock,
            ledger: Mutex::new(Ledger {
                holds: HoldRegistry::new(ttl),
                reservations: HashMap::new(),
                tables: BTreeMap::new(),
                next_table_id: 1,
            }),
            changes: ChangeFeed::default(),
        })
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// The overlap rule enforced on submission.
    pub fn rule(&self) -> OverlapRule {
        self.rule
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    pub fn subscribe(&self) -> Subscription {
        self.changes.subscribe()
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Whether a slot has already started in the restaurant's time zone.
    fn is_past(&self, date: NaiveDate, minutes: u32, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.tz);
        let today = local.date_naive();
        let now_minutes = local.hour() * 60 + local.minute();
        date < today || (date == today && minutes <= now_minutes)
    }

    fn capacity(&self, ledger: &Ledger) -> usize {
        if ledger.tables.is_empty() {
            self.config.slot_capacity as usize
        } else {
            ledger.tables.len()
        }
    }

    /// Distinct tables plus unassigned reservations that conflict with the
    /// slot. `excluding` leaves one reservation out, for edits in place.
    fn occupied(&self, ledger: &Ledger, date: NaiveDate, minutes: u32, excluding: Option<Uuid>) -> usize {
        let time = format_time_of_day(minutes);
        let active = move || ledger.active_on(date).filter(move |r| Some(r.id) != excluding);
        let tables = booked_tables(&time, active(), self.rule).len();
        let unassigned = active()
            .filter(|r| r.table_number.is_none())
            .filter(|r| self.rule.conflicts(&time, &r.reservation_time))
            .count();
        tables + unassigned
    }

    fn is_full(&self, ledger: &Ledger, date: NaiveDate, minutes: u32) -> bool {
        self.occupied(ledger, date, minutes, None) >= self.capacity(ledger)
    }

    fn grid_minutes(&self, time: &str) -> Result<u32, HoldFailure> {
        let minutes = parse_time_of_day(time).map_err(|_| HoldFailure::UnknownSlot)?;
        if !self.grid.contains(minutes) {
            return Err(HoldFailure::UnknownSlot);
        }
        Ok(minutes)
    }

    // --- Slots & holds ---

    /// Status of every slot on `date` as seen by `session_id`.
    pub fn list_slots(&self, date: NaiveDate, session_id: Option<&str>) -> Vec<Slot> {
        let now = self.now();
        let service_minutes = self.rule.service_minutes();
        let ledger = self.ledger();

        self.grid
            .minutes()
            .iter()
            .map(|&minutes| {
                let time = format_time_of_day(minutes);
                let key = SlotKey::new(date, time.clone());
                let (status, mine) = if self.is_past(date, minutes, now) || self.is_full(&ledger, date, minutes) {
                    (SlotStatus::Booked, false)
                } else {
                    match ledger.holds.holder(&key, now) {
                        Some(hold) if Some(hold.session_id.as_str()) == session_id => (SlotStatus::Available, true),
                        Some(_) => (SlotStatus::Held, false),
                        None => (SlotStatus::Available, false),
                    }
                };
                Slot {
                    label: slot_label(minutes, service_minutes),
                    time,
                    status,
                    mine,
                }
            })
            .collect()
    }

    /// Takes (or refreshes) `session_id`'s hold on a slot.
    pub fn hold_slot(&self, date: NaiveDate, time: &str, session_id: &str) -> Result<Hold, ReservoError> {
        let session_id = validate_session_id(session_id)?;
        let minutes = self.grid_minutes(time)?;
        let now = self.now();
        let time = format_time_of_day(minutes);

        let hold = {
            let mut ledger = self.ledger();
            if self.is_past(date, minutes, now) {
                return Err(HoldFailure::SlotInPast.into());
            }
            if self.is_full(&ledger, date, minutes) {
                return Err(HoldFailure::SlotBooked.into());
            }
            ledger.holds.hold(SlotKey::new(date, time.clone()), session_id, now)?
        };

        info!(date = %date, time = %time, session_id, "slot held until {}", hold.expires_at);
        self.changes
            .publish(ChangeEvent::new(Resource::Timeslots, ChangeAction::Update, time, Some(date)));
        Ok(hold)
    }

    /// Releases `session_id`'s hold. Releasing a slot that is not held succeeds with `false`.
    pub fn release_slot(&self, date: NaiveDate, time: &str, session_id: &str) -> Result<bool, ReservoError> {
        let session_id = validate_session_id(session_id)?;
        let time = parse_time_of_day(time)
            .map(format_time_of_day)
            .map_err(|_| HoldFailure::UnknownSlot)?;
        let now = self.now();

        let released = self
            .ledger()
            .holds
            .release(&SlotKey::new(date, time.clone()), session_id, now)?;

        if released {
            info!(date = %date, time = %time, session_id, "slot released");
            self.changes
                .publish(ChangeEvent::new(Resource::Timeslots, ChangeAction::Update, time, Some(date)));
        }
        Ok(released)
    }

    /// Drops expired holds; returns how many were removed.
    pub fn sweep_expired_holds(&self) -> usize {
        let now = self.now();
        let expired = self.ledger().holds.sweep_expired(now);
        if !expired.is_empty() {
            debug!("swept {} expired holds", expired.len());
        }
        for key in &expired {
            self.changes.publish(ChangeEvent::new(
                Resource::Timeslots,
                ChangeAction::Update,
                key.time.clone(),
                Some(key.date),
            ));
        }
        expired.len()
    }

    /// Drops every hold of a session, e.g. when its picker is torn down.
    pub fn release_session(&self, session_id: &str) -> usize {
        let released = self.ledger().holds.release_session(session_id);
        for key in &released {
            self.changes.publish(ChangeEvent::new(
                Resource::Timeslots,
                ChangeAction::Update,
                key.time.clone(),
                Some(key.date),
            ));
        }
        released.len()
    }

    pub fn active_holds(&self) -> usize {
        let now = self.now();
        let mut ledger = self.ledger();
        ledger.holds.sweep_expired(now);
        ledger.holds.len()
    }

    // --- Reservations ---

    /// Reservations ordered by date and time, optionally for one date.
    pub fn list_reservations(&self, date: Option<NaiveDate>) -> Vec<Reservation> {
        let mut reservations: Vec<Reservation> = self
            .ledger()
            .reservations
            .values()
            .filter(|r| date.map_or(true, |d| r.reservation_date == d))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| {
            (a.reservation_date, &a.reservation_time, a.created_at)
                .cmp(&(b.reservation_date, &b.reservation_time, b.created_at))
        });
        reservations
    }

    pub fn get_reservation(&self, id: Uuid) -> Result<Reservation, ReservoError> {
        self.ledger()
            .reservations
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("Reservation {id} not found")))
    }

    /// Public status check by booking code, optionally confirmed by phone.
    pub fn lookup_reservation(&self, code: &str, phone: Option<&str>) -> Result<Reservation, ReservoError> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(validation_error("Booking code is required"));
        }
        let phone = phone
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(validate_phone)
            .transpose()?;

        self.ledger()
            .reservations
            .values()
            .find(|r| r.booking_code == code && phone.as_ref().map_or(true, |p| *p == r.guest_phone))
            .cloned()
            .ok_or_else(|| not_found("No reservation matches that booking code"))
    }

    /// Validates and records a reservation.
    ///
    /// This is the final authoritative check: the slot must not be in the
    /// past, full, or held by another session, and a requested table must be
    /// free under the enforced rule. The submitter's hold is consumed.
    pub fn create_reservation(&self, new: NewReservation) -> Result<Reservation, ReservoError> {
        let guest_name = validate_guest_name(&new.guest_name)?;
        let guest_phone = validate_phone(&new.guest_phone)?;
        let guest_email = validate_email(new.guest_email.as_deref())?;
        let party_size = validate_party_size(new.party_size, self.config.max_party_size)?;
        let date = parse_date(&new.reservation_date)?;
        let minutes = self
            .grid_minutes(&new.reservation_time)
            .map_err(|_| validation_error(format!("{} is not a bookable time", new.reservation_time)))?;
        let time = format_time_of_day(minutes);
        let status = new.status.unwrap_or(ReservationStatus::Pending);
        if !status.is_active() {
            return Err(validation_error("New reservations must be pending or confirmed"));
        }
        let session_id = new
            .session_id
            .as_deref()
            .map(validate_session_id)
            .transpose()?
            .map(str::to_string);

        let now = self.now();
        let key = SlotKey::new(date, time.clone());

        let reservation = {
            let mut ledger = self.ledger();

            if self.is_past(date, minutes, now) {
                return Err(HoldFailure::SlotInPast.into());
            }
            if let Some(hold) = ledger.holds.holder(&key, now) {
                if session_id.as_deref() != Some(hold.session_id.as_str()) {
                    return Err(HoldFailure::SlotHeld.into());
                }
            }
            if let Some(table_number) = new.table_number {
                let table = ledger
                    .tables
                    .get(&table_number)
                    .ok_or_else(|| validation_error(format!("Table {table_number} does not exist")))?;
                if party_size > table.capacity {
                    return Err(validation_error(format!(
                        "{} seats at most {} guests",
                        table.name, table.capacity
                    )));
                }
                if booked_tables(&time, ledger.active_on(date), self.rule).contains(&table_number) {
                    return Err(conflict(format!("Table {table_number} is already booked at {time}")));
                }
            }
            if self.is_full(&ledger, date, minutes) {
                return Err(HoldFailure::SlotBooked.into());
            }

            let booking_code = loop {
                let code = generate_booking_code(&self.config.booking_code_prefix);
                if !ledger.code_taken(&code) {
                    break code;
                }
            };

            let reservation = Reservation {
                id: Uuid::new_v4(),
                guest_name,
                guest_phone,
                guest_email,
                party_size,
                reservation_date: date,
                reservation_time: time.clone(),
                table_number: new.table_number,
                status,
                special_requests: non_empty(new.special_requests),
                admin_notes: non_empty(new.admin_notes),
                payment_slip_url: non_empty(new.payment_slip_url),
                booking_code,
                created_at: now,
                updated_at: now,
            };
            ledger.reservations.insert(reservation.id, reservation.clone());
            if let Some(session_id) = &session_id {
                ledger.holds.consume(&key, session_id);
            }
            reservation
        };

        info!(
            reservation_id = %reservation.id,
            date = %date,
            time = %time,
            "reservation {} created",
            reservation.booking_code
        );
        self.publish_reservation(ChangeAction::Insert, &reservation);
        Ok(reservation)
    }

    /// Applies an admin edit. Table conflicts are re-checked whenever the
    /// date, time, table or status changes and the result is still active.
    pub fn update_reservation(&self, id: Uuid, update: ReservationUpdate) -> Result<Reservation, ReservoError> {
        let guest_name = update.guest_name.as_deref().map(validate_guest_name).transpose()?;
        let guest_phone = update.guest_phone.as_deref().map(validate_phone).transpose()?;
        let guest_email = match update.guest_email.as_deref() {
            Some(email) => Some(validate_email(Some(email))?),
            None => None,
        };
        let party_size = update
            .party_size
            .map(|size| validate_party_size(size, self.config.max_party_size))
            .transpose()?;
        let date = update.reservation_date.as_deref().map(parse_date).transpose()?;
        let time = match update.reservation_time.as_deref() {
            Some(time) => Some(
                self.grid_minutes(time)
                    .map(format_time_of_day)
                    .map_err(|_| validation_error(format!("{time} is not a bookable time")))?,
            ),
            None => None,
        };

        let (previous, reservation) = {
            let mut ledger = self.ledger();
            let current = ledger
                .reservations
                .get(&id)
                .cloned()
                .ok_or_else(|| not_found(format!("Reservation {id} not found")))?;
            let mut next = current.clone();

            if let Some(status) = update.status {
                if !current.status.can_transition_to(status) {
                    return Err(validation_error(format!(
                        "Cannot change status from {} to {}",
                        current.status.as_str(),
                        status.as_str()
                    )));
                }
                next.status = status;
            }
            if let Some(name) = guest_name {
                next.guest_name = name;
            }
            if let Some(phone) = guest_phone {
                next.guest_phone = phone;
            }
            if let Some(email) = guest_email {
                next.guest_email = email;
            }
            if let Some(size) = party_size {
                next.party_size = size;
            }
            if let Some(date) = date {
                next.reservation_date = date;
            }
            if let Some(time) = time {
                next.reservation_time = time;
            }
            if update.clear_table {
                next.table_number = None;
            } else if let Some(table_number) = update.table_number {
                if !ledger.tables.contains_key(&table_number) {
                    return Err(validation_error(format!("Table {table_number} does not exist")));
                }
                next.table_number = Some(table_number);
            }
            if update.special_requests.is_some() {
                next.special_requests = non_empty(update.special_requests);
            }
            if update.admin_notes.is_some() {
                next.admin_notes = non_empty(update.admin_notes);
            }
            if update.payment_slip_url.is_some() {
                next.payment_slip_url = non_empty(update.payment_slip_url);
            }

            let placement_changed = next.reservation_date != current.reservation_date
                || next.reservation_time != current.reservation_time
                || next.table_number != current.table_number
                || next.status.is_active() != current.status.is_active();
            let seating_changed =
                next.party_size != current.party_size || next.table_number != current.table_number;
            if seating_changed && next.status.is_active() {
                if let Some(table) = next.table_number.and_then(|n| ledger.tables.get(&n)) {
                    if next.party_size > table.capacity {
                        return Err(validation_error(format!(
                            "{} seats at most {} guests",
                            table.name, table.capacity
                        )));
                    }
                }
            }
            if placement_changed && next.status.is_active() {
                if let Some(table_number) = next.table_number {
                    let others = ledger
                        .active_on(next.reservation_date)
                        .filter(|r| r.id != id);
                    if booked_tables(&next.reservation_time, others, self.rule).contains(&table_number) {
                        return Err(conflict(format!(
                            "Table {} is already booked at {}",
                            table_number, next.reservation_time
                        )));
                    }
                }
                let minutes = parse_time_of_day(&next.reservation_time)
                    .map_err(|_| validation_error(format!("{} is not a bookable time", next.reservation_time)))?;
                if self.occupied(&ledger, next.reservation_date, minutes, Some(id)) >= self.capacity(&ledger) {
                    return Err(HoldFailure::SlotBooked.into());
                }
            }

            if next == current {
                return Ok(current);
            }
            next.updated_at = self.now();
            ledger.reservations.insert(id, next.clone());
            (SlotKey::new(current.reservation_date, current.reservation_time), next)
        };

        info!(reservation_id = %id, status = reservation.status.as_str(), "reservation updated");
        self.publish_reservation(ChangeAction::Update, &reservation);
        if previous.date != reservation.reservation_date || previous.time != reservation.reservation_time {
            self.changes.publish(ChangeEvent::new(
                Resource::Timeslots,
                ChangeAction::Update,
                previous.time,
                Some(previous.date),
            ));
        }
        Ok(reservation)
    }

    /// Permanently removes a reservation. Cancelling is a status update instead.
    pub fn delete_reservation(&self, id: Uuid) -> Result<Reservation, ReservoError> {
        let removed = self
            .ledger()
            .reservations
            .remove(&id)
            .ok_or_else(|| not_found(format!("Reservation {id} not found")))?;
        warn!(reservation_id = %id, "reservation {} deleted", removed.booking_code);
        self.publish_reservation(ChangeAction::Delete, &removed);
        Ok(removed)
    }

    fn publish_reservation(&self, action: ChangeAction, reservation: &Reservation) {
        let date = Some(reservation.reservation_date);
        self.changes
            .publish(ChangeEvent::new(Resource::Reservations, action, reservation.id.to_string(), date));
        self.changes.publish(ChangeEvent::new(
            Resource::Timeslots,
            ChangeAction::Update,
            reservation.reservation_time.clone(),
            date,
        ));
    }

    // --- Tables ---

    pub fn list_tables(&self) -> Vec<Table> {
        self.ledger().tables.values().cloned().collect()
    }

    pub fn create_table(&self, new: NewTable) -> Result<Table, ReservoError> {
        let name = validate_table_name(&new.name)?;
        validate_table_capacity(new.capacity)?;

        let table = {
            let mut ledger = self.ledger();
            if name_taken(&ledger, &name, None) {
                return Err(conflict(format!("A table named {name} already exists")));
            }
            let table = Table {
                id: ledger.next_table_id,
                name,
                capacity: new.capacity,
                shape: new.shape,
                zone: non_empty(new.zone),
                x: new.x,
                y: new.y,
                width: new.width,
                height: new.height,
            };
            ledger.next_table_id += 1;
            ledger.tables.insert(table.id, table.clone());
            table
        };

        info!("table {} ({}) created", table.id, table.name);
        self.changes
            .publish(ChangeEvent::new(Resource::Tables, ChangeAction::Insert, table.id.to_string(), None));
        Ok(table)
    }

    pub fn update_table(&self, id: u32, update: TableUpdate) -> Result<Table, ReservoError> {
        let name = update.name.as_deref().map(validate_table_name).transpose()?;
        if let Some(capacity) = update.capacity {
            validate_table_capacity(capacity)?;
        }

        let table = {
            let mut ledger = self.ledger();
            if let Some(name) = &name {
                if name_taken(&ledger, name, Some(id)) {
                    return Err(conflict(format!("A table named {name} already exists")));
                }
            }
            let table = ledger
                .tables
                .get_mut(&id)
                .ok_or_else(|| not_found(format!("Table {id} not found")))?;
            if let Some(name) = name {
                table.name = name;
            }
            if let Some(capacity) = update.capacity {
                table.capacity = capacity;
            }
            if let Some(shape) = update.shape {
                table.shape = shape;
            }
            if update.zone.is_some() {
                table.zone = non_empty(update.zone);
            }
            table.x = update.x.unwrap_or(table.x);
            table.y = update.y.unwrap_or(table.y);
            table.width = update.width.unwrap_or(table.width);
            table.height = update.height.unwrap_or(table.height);
            table.clone()
        };

        self.changes
            .publish(ChangeEvent::new(Resource::Tables, ChangeAction::Update, id.to_string(), None));
        Ok(table)
    }

    /// Removes a table. Reservations keep their (now dangling) table number.
    pub fn delete_table(&self, id: u32) -> Result<Table, ReservoError> {
        let removed = self
            .ledger()
            .tables
            .remove(&id)
            .ok_or_else(|| not_found(format!("Table {id} not found")))?;
        info!("table {} ({}) deleted", removed.id, removed.name);
        self.changes
            .publish(ChangeEvent::new(Resource::Tables, ChangeAction::Delete, id.to_string(), None));
        Ok(removed)
    }

    /// Tables with a `booked` flag for a candidate time, under `flow`'s rule
    /// (the enforced rule when `flow` is `None`).
    pub fn table_availability(
        &self,
        date: NaiveDate,
        time: &str,
        flow: Option<BookingFlow>,
    ) -> Result<Vec<TableAvailability>, ReservoError> {
        let time = parse_time_of_day(time)
            .map(format_time_of_day)
            .map_err(|e| validation_error(e.to_string()))?;
        let rule = flow.map_or(self.rule, |flow| OverlapRule::for_flow(flow, &self.config.overlap));

        let ledger = self.ledger();
        let booked = booked_tables(&time, ledger.active_on(date), rule);
        Ok(ledger
            .tables
            .values()
            .map(|table| TableAvailability {
                booked: booked.contains(&table.id),
                table: table.clone(),
            })
            .collect())
    }
}

fn validate_table_name(name: &str) -> Result<String, ReservoError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(validation_error("Table name is required"));
    }
    Ok(name.to_string())
}

fn validate_table_capacity(capacity: u32) -> Result<(), ReservoError> {
    if capacity == 0 {
        return Err(validation_error("Table capacity must be positive"));
    }
    Ok(())
}

fn name_taken(ledger: &Ledger, name: &str, except: Option<u32>) -> bool {
    ledger
        .tables
        .values()
        .any(|t| Some(t.id) != except && t.name.eq_ignore_ascii_case(name))
}

fn generate_booking_code(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}{}", prefix, &random[..BOOKING_CODE_LENGTH])
}
