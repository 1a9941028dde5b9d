// File: crates/reservo_booking/src/handlers.rs
use crate::changes::ChangeEvent;
use crate::models::{
    NewReservation, NewTable, Reservation, ReservationUpdate, Table, TableAvailability, TableUpdate,
};
use crate::service::BookingService;
use crate::slots::Slot;
use crate::validation::{parse_date, validate_session_id};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use reservo_common::{validation_error, ReservoError};
use reservo_config::{AppConfig, BookingFlow};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub service: Arc<BookingService>,
}

// --- Request / response types ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct TimeslotsQuery {
    /// Date in YYYY-MM-DD format
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2024-06-01"))]
    pub date: String,
    /// Session of the requesting picker, used to flag its own hold.
    pub session_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimeslotsResponse {
    pub slots: Vec<Slot>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TimeslotAction {
    Hold,
    Release,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimeslotRequest {
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2024-06-01"))]
    pub date: String,
    #[cfg_attr(feature = "openapi", schema(example = "18:00"))]
    pub time: String,
    pub action: TimeslotAction,
    pub session_id: String,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimeslotResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionReleaseResponse {
    pub success: bool,
    /// Number of holds dropped.
    pub released: usize,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ReservationsQuery {
    /// Only reservations on this date (YYYY-MM-DD); all when absent.
    pub date: Option<String>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct LookupQuery {
    /// Booking code, e.g. RS3F9A2C
    pub code: String,
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct TableAvailabilityQuery {
    pub date: String,
    pub time: String,
    /// Overlap rule to apply; the server's enforced rule when absent.
    pub flow: Option<BookingFlow>,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub active_holds: usize,
    pub conflict_flow: BookingFlow,
}

// --- Timeslots ---

/// Slot grid for a date with the status each slot has for the caller.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/timeslots",
    params(TimeslotsQuery),
    responses(
        (status = 200, description = "Slots for the date", body = TimeslotsResponse),
        (status = 400, description = "Invalid date", body = reservo_common::ErrorBody)
    ),
    tag = "Timeslots"
))]
pub async fn list_timeslots_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<TimeslotsQuery>,
) -> Result<Json<TimeslotsResponse>, ReservoError> {
    let date = parse_date(&query.date)?;
    let slots = state.service.list_slots(date, query.session_id.as_deref());
    debug!("listed {} slots for {}", slots.len(), date);
    Ok(Json(TimeslotsResponse { slots }))
}

/// Hold or release a slot for a session.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/timeslots",
    request_body = TimeslotRequest,
    responses(
        (status = 200, description = "Hold taken or released", body = TimeslotResponse),
        (status = 400, description = "Invalid request or unknown slot", body = reservo_common::ErrorBody),
        (status = 403, description = "Hold owned by another session", body = reservo_common::ErrorBody),
        (status = 409, description = "Slot held by another session, booked or in the past", body = reservo_common::ErrorBody)
    ),
    tag = "Timeslots"
))]
pub async fn timeslot_action_handler(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<TimeslotRequest>,
) -> Result<Json<TimeslotResponse>, ReservoError> {
    let date = parse_date(&request.date)?;
    debug!(
        "timeslot {:?} {} {} (locale {:?})",
        request.action, date, request.time, request.locale
    );

    let response = match request.action {
        TimeslotAction::Hold => {
            let hold = state.service.hold_slot(date, &request.time, &request.session_id)?;
            TimeslotResponse {
                success: true,
                expires_at: Some(hold.expires_at),
            }
        }
        TimeslotAction::Release => {
            state.service.release_slot(date, &request.time, &request.session_id)?;
            TimeslotResponse {
                success: true,
                expires_at: None,
            }
        }
    };
    Ok(Json(response))
}

/// Drop every hold a session owns, e.g. when its page unloads.
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/timeslots/sessions/{session_id}",
    params(("session_id" = String, Path, description = "Session whose holds are dropped")),
    responses(
        (status = 200, description = "Holds released", body = SessionReleaseResponse),
        (status = 400, description = "Invalid session id", body = reservo_common::ErrorBody)
    ),
    tag = "Timeslots"
))]
pub async fn release_session_handler(
    State(state): State<Arc<BookingState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionReleaseResponse>, ReservoError> {
    let session_id = validate_session_id(&session_id)?;
    let released = state.service.release_session(session_id);
    info!(session_id, "released {} holds for session", released);
    Ok(Json(SessionReleaseResponse {
        success: true,
        released,
    }))
}

// --- Reservations ---

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/reservations",
    params(ReservationsQuery),
    responses(
        (status = 200, description = "Reservations ordered by date and time", body = [Reservation])
    ),
    tag = "Reservations"
))]
pub async fn list_reservations_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<ReservationsQuery>,
) -> Result<Json<Vec<Reservation>>, ReservoError> {
    let date = query
        .date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(parse_date)
        .transpose()?;
    Ok(Json(state.service.list_reservations(date)))
}

/// Submit a reservation. This is the authoritative availability check.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/reservations",
    request_body = NewReservation,
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 400, description = "Validation failed", body = reservo_common::ErrorBody),
        (status = 409, description = "Slot booked, held by another session, or table taken", body = reservo_common::ErrorBody)
    ),
    tag = "Reservations"
))]
pub async fn create_reservation_handler(
    State(state): State<Arc<BookingState>>,
    Json(new): Json<NewReservation>,
) -> Result<(StatusCode, Json<Reservation>), ReservoError> {
    let reservation = state.service.create_reservation(new)?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation id")),
    request_body = ReservationUpdate,
    responses(
        (status = 200, description = "Reservation updated", body = Reservation),
        (status = 400, description = "Validation failed or status change not allowed", body = reservo_common::ErrorBody),
        (status = 404, description = "No such reservation", body = reservo_common::ErrorBody),
        (status = 409, description = "Table taken at that time", body = reservo_common::ErrorBody)
    ),
    tag = "Reservations"
))]
pub async fn update_reservation_handler(
    State(state): State<Arc<BookingState>>,
    Path(id): Path<Uuid>,
    Json(update): Json<ReservationUpdate>,
) -> Result<Json<Reservation>, ReservoError> {
    Ok(Json(state.service.update_reservation(id, update)?))
}

/// Permanently delete a reservation.
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation deleted", body = DeleteResponse),
        (status = 404, description = "No such reservation", body = reservo_common::ErrorBody)
    ),
    tag = "Reservations"
))]
pub async fn delete_reservation_handler(
    State(state): State<Arc<BookingState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ReservoError> {
    state.service.delete_reservation(id)?;
    Ok(Json(DeleteResponse {
        success: true,
        id: id.to_string(),
    }))
}

/// Guest-facing status check by booking code.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/reservations/lookup",
    params(LookupQuery),
    responses(
        (status = 200, description = "Matching reservation", body = Reservation),
        (status = 404, description = "No match", body = reservo_common::ErrorBody)
    ),
    tag = "Reservations"
))]
pub async fn lookup_reservation_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Reservation>, ReservoError> {
    let reservation = state
        .service
        .lookup_reservation(&query.code, query.phone.as_deref())?;
    Ok(Json(reservation))
}

// --- Tables ---

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tables",
    responses((status = 200, description = "All tables", body = [Table])),
    tag = "Tables"
))]
pub async fn list_tables_handler(State(state): State<Arc<BookingState>>) -> Json<Vec<Table>> {
    Json(state.service.list_tables())
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/tables",
    request_body = NewTable,
    responses(
        (status = 201, description = "Table created", body = Table),
        (status = 400, description = "Validation failed", body = reservo_common::ErrorBody),
        (status = 409, description = "Name already used", body = reservo_common::ErrorBody)
    ),
    tag = "Tables"
))]
pub async fn create_table_handler(
    State(state): State<Arc<BookingState>>,
    Json(new): Json<NewTable>,
) -> Result<(StatusCode, Json<Table>), ReservoError> {
    let table = state.service.create_table(new)?;
    Ok((StatusCode::CREATED, Json(table)))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/tables/{id}",
    params(("id" = u32, Path, description = "Table id")),
    request_body = TableUpdate,
    responses(
        (status = 200, description = "Table updated", body = Table),
        (status = 404, description = "No such table", body = reservo_common::ErrorBody),
        (status = 409, description = "Name already used", body = reservo_common::ErrorBody)
    ),
    tag = "Tables"
))]
pub async fn update_table_handler(
    State(state): State<Arc<BookingState>>,
    Path(id): Path<u32>,
    Json(update): Json<TableUpdate>,
) -> Result<Json<Table>, ReservoError> {
    Ok(Json(state.service.update_table(id, update)?))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/tables/{id}",
    params(("id" = u32, Path, description = "Table id")),
    responses(
        (status = 200, description = "Table deleted", body = DeleteResponse),
        (status = 404, description = "No such table", body = reservo_common::ErrorBody)
    ),
    tag = "Tables"
))]
pub async fn delete_table_handler(
    State(state): State<Arc<BookingState>>,
    Path(id): Path<u32>,
) -> Result<Json<DeleteResponse>, ReservoError> {
    state.service.delete_table(id)?;
    Ok(Json(DeleteResponse {
        success: true,
        id: id.to_string(),
    }))
}

/// Tables flagged as booked or free for a candidate date and time.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/tables/availability",
    params(TableAvailabilityQuery),
    responses(
        (status = 200, description = "Tables with booked flag", body = [TableAvailability]),
        (status = 400, description = "Invalid date or time", body = reservo_common::ErrorBody)
    ),
    tag = "Tables"
))]
pub async fn table_availability_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<TableAvailabilityQuery>,
) -> Result<Json<Vec<TableAvailability>>, ReservoError> {
    let date = parse_date(&query.date)?;
    if query.time.trim().is_empty() {
        return Err(validation_error("time is required"));
    }
    Ok(Json(state.service.table_availability(date, &query.time, query.flow)?))
}

// --- Changes & health ---

/// Server-sent change events for reservations, tables and timeslots.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/changes",
    responses((status = 200, description = "text/event-stream of change events", body = ChangeEvent)),
    tag = "Changes"
))]
pub async fn changes_handler(
    State(state): State<Arc<BookingState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("change subscriber connected");
    let stream = state
        .service
        .subscribe()
        .into_stream()
        .filter_map(|event: ChangeEvent| {
            serde_json::to_string(&event)
                .ok()
                .map(|json| Ok(Event::default().event("change").data(json)))
        });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Health"
))]
pub async fn health_handler(State(state): State<Arc<BookingState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_holds: state.service.active_holds(),
        conflict_flow: state.config.booking.conflict_flow,
    })
}
