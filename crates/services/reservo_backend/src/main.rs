// File: services/reservo_backend/src/main.rs
use axum::{routing::get, Router};
use reservo_booking::routes as booking_routes;
use reservo_booking::sweeper::spawn_hold_sweeper;
use reservo_booking::{BookingService, SystemClock};
use reservo_common::{log_result, logging, ReservoError};
use reservo_config::load_config;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ReservoError> {
    let config = Arc::new(load_config().map_err(|e| ReservoError::ConfigError(e.to_string()))?);
    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = logging::init_from_config(&config.logging);

    let service = Arc::new(log_result(
        BookingService::new(config.booking.clone(), Arc::new(SystemClock)),
        "booking service initialised",
        "booking configuration rejected",
    )?);
    let _sweeper = spawn_hold_sweeper(
        service.clone(),
        Duration::from_secs(config.booking.hold_sweep_interval_seconds),
    );

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Reservo API!" }))
        .merge(booking_routes::routes(config.clone(), service));

    #[allow(unused_mut)] // mutable only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use reservo_booking::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Reservo API",
                version = "0.1.0",
                description = "Table reservations with session slot holds",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = log_result(
        TcpListener::bind(&addr).await,
        &format!("bound {addr}"),
        &format!("failed to bind {addr}"),
    )
    .map_err(|e| ReservoError::InternalError(format!("failed to bind {addr}: {e}")))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| ReservoError::InternalError(e.to_string()))
}
