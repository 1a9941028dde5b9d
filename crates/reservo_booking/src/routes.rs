// --- File: crates/reservo_booking/src/routes.rs ---

use crate::handlers::{
    changes_handler, create_reservation_handler, create_table_handler, delete_reservation_handler,
    delete_table_handler, health_handler, list_reservations_handler, list_tables_handler,
    list_timeslots_handler, lookup_reservation_handler, release_session_handler,
    table_availability_handler,
    timeslot_action_handler, update_reservation_handler, update_table_handler, BookingState,
};
use crate::service::BookingService;
use axum::{
    routing::{delete, get, put},
    Router,
};
use reservo_config::AppConfig;
use std::sync::Arc;

/// All booking routes, relative to the `/api` prefix the backend nests them under.
pub fn routes(config: Arc<AppConfig>, service: Arc<BookingService>) -> Router {
    let state = Arc::new(BookingState { config, service });

    Router::new()
        .route(
            "/timeslots",
            get(list_timeslots_handler).post(timeslot_action_handler),
        )
        .route(
            "/timeslots/sessions/{session_id}",
            delete(release_session_handler),
        )
        .route(
            "/reservations",
            get(list_reservations_handler).post(create_reservation_handler),
        )
        .route("/reservations/lookup", get(lookup_reservation_handler))
        .route(
            "/reservations/{id}",
            put(update_reservation_handler).delete(delete_reservation_handler),
        )
        .route(
            "/tables",
            get(list_tables_handler).post(create_table_handler),
        )
        .route("/tables/availability", get(table_availability_handler))
        .route(
            "/tables/{id}",
            put(update_table_handler).delete(delete_table_handler),
        )
        .route("/changes", get(changes_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
