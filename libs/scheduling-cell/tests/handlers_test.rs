use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::router::{scheduling_router, SchedulingState};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TEST_TOKEN};

async fn setup() -> (MockServer, Router, String) {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let clinic_id = config.clinic_id.clone();
    let app = scheduling_router(SchedulingState::new(config));
    (mock_server, app, clinic_id)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_generate_slots_worked_example() {
    let (_server, app, _) = setup().await;

    let response = app
        .oneshot(json_request("POST", "/slots/generate", json!({
            "operating_hours": { "open": "09:00", "close": "12:00" },
            "slot_duration_minutes": 30,
            "breaks": [{ "id": "lunch", "label": "Lunch", "start": "10:30", "end": "11:00" }],
            "booking_mode": "auto"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["slots"], json!(["09:00", "09:30", "10:00", "11:00", "11:30"]));
    assert_eq!(body["count"], 5);
    assert_eq!(body["message"], "5 slots available");
}

#[tokio::test]
async fn test_generate_slots_rejects_zero_duration() {
    let (_server, app, _) = setup().await;

    let response = app
        .oneshot(json_request("POST", "/slots/generate", json!({
            "operating_hours": { "open": "09:00", "close": "12:00" },
            "slot_duration_minutes": 0
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_slots_reversed_window_is_empty() {
    let (_server, app, _) = setup().await;

    let response = app
        .oneshot(json_request("POST", "/slots/generate", json!({
            "operating_hours": { "open": "18:00", "close": "08:00" },
            "slot_duration_minutes": 30
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["slots"], json!([]));
    assert_eq!(body["message"], "No slots available for this date");
}

#[tokio::test]
async fn test_available_slots_for_date() {
    let (server, app, clinic_id) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/scheduling_configs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::scheduling_config_response(&clinic_id)
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/get_available_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockSupabaseResponses::available_slots_response(&["09:00:00", "11:30:00"]),
        ))
        .mount(&server)
        .await;

    let response = app.oneshot(get_request("/slots?date=2025-03-10")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["source"], "remote");
    assert_eq!(body["slots"], json!(["09:00", "11:30"]));
    assert_eq!(body["date"], "2025-03-10");
}

#[tokio::test]
async fn test_available_slots_without_config() {
    let (server, app, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/scheduling_configs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let response = app.oneshot(get_request("/slots?date=2025-03-10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_available_slots_requires_bearer_token() {
    let (_server, app, _) = setup().await;

    let request = Request::builder()
        .uri("/slots?date=2025-03-10")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_book_then_list() {
    let (server, app, clinic_id) = setup().await;

    let stored = MockSupabaseResponses::appointment_response(&clinic_id, "2025-03-10", "09:30:00");

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([stored.clone()])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored.clone()])))
        .mount(&server)
        .await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/appointments", json!({
            "patient_name": "Test Patient",
            "patient_phone": "+10000000000",
            "date": "2025-03-10",
            "time": "09:30",
            "duration_minutes": 30,
            "chair_number": 1
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let booked = body_json(response).await;
    assert_eq!(booked["id"], stored["id"]);
    assert_eq!(booked["time"], "09:30");

    let response = app.oneshot(get_request("/appointments?date=2025-03-10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = body_json(response).await;
    assert_eq!(listing["total"], 1);
}

#[tokio::test]
async fn test_failed_booking_surfaces_bad_gateway() {
    let (server, app, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("insert failed"))
        .mount(&server)
        .await;

    let response = app
        .oneshot(json_request("POST", "/appointments", json!({
            "patient_name": "Test Patient",
            "date": "2025-03-10",
            "time": "09:30",
            "duration_minutes": 30
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_generate_slots_huge_duration_is_empty() {
    let (_server, app, _) = setup().await;

    let response = app
        .oneshot(json_request("POST", "/slots/generate", json!({
            "operating_hours": { "open": "09:00", "close": "12:00" },
            "slot_duration_minutes": i32::MAX
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["slots"], json!([]));
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_status_update_for_unknown_appointment() {
    let (server, app, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let uri = format!("/appointments/{}/status", Uuid::new_v4());
    let response = app
        .oneshot(json_request("PATCH", &uri, json!({ "status": "confirmed" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_loaded_appointment() {
    let (server, app, clinic_id) = setup().await;

    let stored = MockSupabaseResponses::appointment_response(&clinic_id, "2025-03-10", "10:00:00");
    let mut cancelled = stored.clone();
    cancelled["status"] = json!("cancelled");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored.clone()])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cancelled])))
        .mount(&server)
        .await;

    let response = app.clone().oneshot(get_request("/appointments?date=2025-03-10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let id = stored["id"].as_str().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri(format!("/appointments/{}/cancel", id))
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["appointment"]["status"], "cancelled");
}

#[tokio::test]
async fn test_status_update_without_prior_listing() {
    let (server, app, clinic_id) = setup().await;

    let stored = MockSupabaseResponses::appointment_response(&clinic_id, "2025-03-10", "11:00:00");
    let mut confirmed = stored.clone();
    confirmed["status"] = json!("confirmed");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored.clone()])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([confirmed])))
        .expect(1)
        .mount(&server)
        .await;

    let uri = format!("/appointments/{}/status", stored["id"].as_str().unwrap());
    let response = app
        .oneshot(json_request("PATCH", &uri, json!({ "status": "confirmed" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "confirmed");
}
