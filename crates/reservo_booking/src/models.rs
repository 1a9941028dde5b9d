// --- File: crates/reservo_booking/src/models.rs ---
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Reservations ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Pending and confirmed reservations occupy their table.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    /// Whether an admin may move a reservation from `self` to `next`.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        ) || *self == next
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub party_size: u32,
    pub reservation_date: NaiveDate,
    /// Start time, normalized to `HH:MM`.
    pub reservation_time: String,
    /// Loose reference to `Table::id`.
    pub table_number: Option<u32>,
    pub status: ReservationStatus,
    pub special_requests: Option<String>,
    pub admin_notes: Option<String>,
    pub payment_slip_url: Option<String>,
    pub booking_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /reservations`, sent by the guest flow or the back office.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub guest_name: String,
    pub guest_phone: String,
    #[serde(default)]
    pub guest_email: Option<String>,
    pub party_size: u32,
    /// `YYYY-MM-DD`
    pub reservation_date: String,
    /// `HH:MM`
    pub reservation_time: String,
    #[serde(default)]
    pub table_number: Option<u32>,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub payment_slip_url: Option<String>,
    /// Admin-created bookings may start out confirmed.
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    /// Session that holds the slot; its hold is consumed on success.
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

/// Body of `PUT /reservations/{id}`; absent fields stay unchanged.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationUpdate {
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_email: Option<String>,
    pub party_size: Option<u32>,
    pub reservation_date: Option<String>,
    pub reservation_time: Option<String>,
    pub table_number: Option<u32>,
    /// Set to true to detach the reservation from its table.
    #[serde(default)]
    pub clear_table: bool,
    pub status: Option<ReservationStatus>,
    pub special_requests: Option<String>,
    pub admin_notes: Option<String>,
    pub payment_slip_url: Option<String>,
}

// --- Tables ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TableShape {
    #[default]
    Square,
    Round,
    Rectangle,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub id: u32,
    pub name: String,
    pub capacity: u32,
    pub shape: TableShape,
    pub zone: Option<String>,
    /// Floor plan position and size.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTable {
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub shape: TableShape,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_table_size")]
    pub width: f32,
    #[serde(default = "default_table_size")]
    pub height: f32,
}

fn default_table_size() -> f32 {
    80.0
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableUpdate {
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub shape: Option<TableShape>,
    pub zone: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// A table together with whether it is taken at the requested time.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableAvailability {
    #[serde(flatten)]
    pub table: Table,
    pub booked: bool,
}
