use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use reservo_booking::routes::routes;
use reservo_booking::{BookingService, ManualClock};
use reservo_common::ErrorBody;
use reservo_config::AppConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// 2024-06-01 12:00 in Bangkok, so evening slots on that date are bookable.
fn create_app() -> Router {
    let config = Arc::new(AppConfig::default());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 5, 0, 0).unwrap()));
    let service = Arc::new(BookingService::new(config.booking.clone(), clock).unwrap());
    routes(config, service)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn slot<'a>(body: &'a Value, time: &str) -> &'a Value {
    body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["time"] == time)
        .unwrap()
}

fn hold_body(time: &str, session: &str, action: &str) -> Value {
    json!({
        "date": "2024-06-01",
        "time": time,
        "action": action,
        "sessionId": session,
        "locale": "th"
    })
}

fn reservation_body(time: &str, session: Option<&str>) -> Value {
    json!({
        "guest_name": "Somchai Jaidee",
        "guest_phone": "0812345678",
        "party_size": 2,
        "reservation_date": "2024-06-01",
        "reservation_time": time,
        "sessionId": session
    })
}

#[tokio::test]
async fn test_timeslots_lists_the_grid() {
    let app = create_app();
    let (status, body) = send(&app, Method::GET, "/timeslots?date=2024-06-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"].as_array().unwrap().len(), 21);
    let evening = slot(&body, "18:00");
    assert_eq!(evening["status"], "available");
    assert_eq!(evening["label"], "18:00-19:30");
    assert_eq!(evening["mine"], false);
}

#[tokio::test]
async fn test_timeslots_rejects_bad_date() {
    let app = create_app();
    let (status, body) = send(&app, Method::GET, "/timeslots?date=June", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorBody = serde_json::from_value(body).unwrap();
    assert_eq!(error.code, "validation_failed");
}

#[tokio::test]
async fn test_hold_conflict_returns_409_with_code() {
    let app = create_app();
    let (status, body) = send(&app, Method::POST, "/timeslots", Some(hold_body("18:00", "s1", "hold"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["expiresAt"].is_string());

    let (status, body) = send(&app, Method::POST, "/timeslots", Some(hold_body("18:00", "s2", "hold"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "slot_held");

    let (_, body) = send(&app, Method::GET, "/timeslots?date=2024-06-01&sessionId=s1", None).await;
    assert_eq!(slot(&body, "18:00")["mine"], true);
    let (_, body) = send(&app, Method::GET, "/timeslots?date=2024-06-01&sessionId=s2", None).await;
    assert_eq!(slot(&body, "18:00")["status"], "held");
}

#[tokio::test]
async fn test_session_teardown_drops_all_its_holds() {
    let app = create_app();
    send(&app, Method::POST, "/timeslots", Some(hold_body("18:00", "s1", "hold"))).await;
    send(&app, Method::POST, "/timeslots", Some(hold_body("18:30", "s1", "hold"))).await;

    let (status, body) = send(&app, Method::DELETE, "/timeslots/sessions/s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["released"], 2);

    let (_, body) = send(&app, Method::GET, "/timeslots?date=2024-06-01&sessionId=s2", None).await;
    assert_eq!(slot(&body, "18:00")["status"], "available");
    assert_eq!(slot(&body, "18:30")["status"], "available");

    let (status, _) = send(&app, Method::DELETE, "/timeslots/sessions/%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_release_frees_the_slot() {
    let app = create_app();
    send(&app, Method::POST, "/timeslots", Some(hold_body("19:00", "s1", "hold"))).await;

    let (status, _) = send(&app, Method::POST, "/timeslots", Some(hold_body("19:00", "s2", "release"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, "/timeslots", Some(hold_body("19:00", "s1", "release"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("expiresAt").is_none());

    let (status, _) = send(&app, Method::POST, "/timeslots", Some(hold_body("19:00", "s2", "hold"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_hold_on_past_slot_is_rejected() {
    let app = create_app();
    let (status, body) = send(&app, Method::POST, "/timeslots", Some(hold_body("11:00", "s1", "hold"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "slot_in_past");
}

#[tokio::test]
async fn test_submit_is_the_final_check() {
    let app = create_app();
    send(&app, Method::POST, "/timeslots", Some(hold_body("18:00", "s1", "hold"))).await;

    let (status, body) = send(&app, Method::POST, "/reservations", Some(reservation_body("18:00", Some("s2")))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "slot_held");

    let (status, body) = send(&app, Method::POST, "/reservations", Some(reservation_body("18:00", Some("s1")))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    let code = body["booking_code"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::POST, "/reservations", Some(reservation_body("18:30", Some("s2")))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "slot_booked");

    let (status, body) = send(&app, Method::GET, &format!("/reservations/lookup?code={code}&phone=0812345678"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reservation_time"], "18:00");
}

#[tokio::test]
async fn test_reservation_validation_errors() {
    let app = create_app();
    let mut body = reservation_body("18:00", None);
    body["guest_phone"] = json!("12");
    let (status, response) = send(&app, Method::POST, "/reservations", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "validation_failed");

    let mut body = reservation_body("18:00", None);
    body["party_size"] = json!(0);
    let (status, _) = send(&app, Method::POST, "/reservations", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reservation_update_and_delete() {
    let app = create_app();
    let (_, created) = send(&app, Method::POST, "/reservations", Some(reservation_body("18:00", None))).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::PUT, &format!("/reservations/{id}"), Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");

    let (status, body) = send(&app, Method::PUT, &format!("/reservations/{id}"), Some(json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");

    let (_, list) = send(&app, Method::GET, "/reservations?date=2024-06-01", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/reservations/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::DELETE, &format!("/reservations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (_, list) = send(&app, Method::GET, "/reservations", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_tables_and_availability() {
    let app = create_app();
    let (status, table) = send(&app, Method::POST, "/tables", Some(json!({ "name": "T1", "capacity": 4, "shape": "round" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(table["width"], 80.0);
    send(&app, Method::POST, "/tables", Some(json!({ "name": "T2", "capacity": 4 }))).await;

    let (status, _) = send(&app, Method::POST, "/tables", Some(json!({ "name": "t1", "capacity": 2 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut booking = reservation_body("18:00", None);
    booking["table_number"] = json!(1);
    let (status, _) = send(&app, Method::POST, "/reservations", Some(booking)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, wizard) = send(&app, Method::GET, "/tables/availability?date=2024-06-01&time=19:50&flow=wizard", None).await;
    assert!(wizard.as_array().unwrap().iter().all(|t| t["booked"] == false));

    let (_, form) = send(&app, Method::GET, "/tables/availability?date=2024-06-01&time=19:50&flow=form", None).await;
    let t1 = form.as_array().unwrap().iter().find(|t| t["id"] == 1).unwrap();
    assert_eq!(t1["booked"], true);
    assert_eq!(t1["name"], "T1");

    let (status, body) = send(&app, Method::PUT, "/tables/2", Some(json!({ "zone": "Patio" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zone"], "Patio");

    let (status, _) = send(&app, Method::DELETE, "/tables/2", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, tables) = send(&app, Method::GET, "/tables", None).await;
    assert_eq!(tables.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_health() {
    let app = create_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["conflict_flow"], "wizard");
}
