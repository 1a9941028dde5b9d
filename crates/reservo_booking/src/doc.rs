// File: crates/reservo_booking/src/doc.rs

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::changes::{ChangeAction, ChangeEvent, Resource};
use crate::handlers::{
    DeleteResponse, HealthResponse, SessionReleaseResponse, TimeslotAction, TimeslotRequest,
    TimeslotResponse, TimeslotsResponse,
};
use crate::models::{
    NewReservation, NewTable, Reservation, ReservationStatus, ReservationUpdate, Table,
    TableAvailability, TableShape, TableUpdate,
};
use crate::slots::{Slot, SlotStatus};
use reservo_common::{ErrorBody, HoldFailure};
use reservo_config::BookingFlow;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::list_timeslots_handler,
        crate::handlers::timeslot_action_handler,
        crate::handlers::release_session_handler,
        crate::handlers::list_reservations_handler,
        crate::handlers::create_reservation_handler,
        crate::handlers::update_reservation_handler,
        crate::handlers::delete_reservation_handler,
        crate::handlers::lookup_reservation_handler,
        crate::handlers::list_tables_handler,
        crate::handlers::create_table_handler,
        crate::handlers::update_table_handler,
        crate::handlers::delete_table_handler,
        crate::handlers::table_availability_handler,
        crate::handlers::changes_handler,
        crate::handlers::health_handler
    ),
    components(
        schemas(
            Slot,
            SlotStatus,
            TimeslotsResponse,
            TimeslotAction,
            TimeslotRequest,
            TimeslotResponse,
            SessionReleaseResponse,
            Reservation,
            ReservationStatus,
            NewReservation,
            ReservationUpdate,
            Table,
            TableShape,
            NewTable,
            TableUpdate,
            TableAvailability,
            DeleteResponse,
            HealthResponse,
            ChangeEvent,
            Resource,
            ChangeAction,
            ErrorBody,
            HoldFailure,
            BookingFlow
        )
    ),
    tags(
        (name = "Timeslots", description = "Slot status and session holds"),
        (name = "Reservations", description = "Reservation ledger"),
        (name = "Tables", description = "Floor plan tables"),
        (name = "Changes", description = "Server-sent change feed"),
        (name = "Health", description = "Liveness")
    ),
    servers(
        (url = "/api", description = "Reservo API server")
    )
)]
pub struct BookingApiDoc;
