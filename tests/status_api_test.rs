// Integration tests for the status document API
//
// Every write goes through the router with a valid API key; the document is
// inspected through the store handle shared with the server.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use spaceapi::document::{SpaceApi, MAX_EVENTS};
use spaceapi::server::{ServerConfig, SpaceApiServer};
use tower::ServiceExt;

const KEY: &str = "test-key";

fn document() -> SpaceApi {
    serde_json::from_value(json!({
        "api_compatibility": ["15"],
        "space": "Test Space",
        "logo": "https://example.org/logo.png",
        "url": "https://example.org",
        "location": { "lat": 52.5, "lon": 13.4, "address": "Somewhere 1" },
        "contact": { "email": "info@example.org" },
        "state": {
            "open": true,
            "lastchange": 1000,
            "message": "A",
            "trigger_person": "Bob"
        },
        "events": [
            { "name": "original", "type": "check-in", "timestamp": 1000 }
        ],
        "sensors": {
            "people_now_present": [
                { "value": 2, "location": "Main Space", "name": "People Counter" }
            ]
        }
    }))
    .unwrap()
}

fn setup() -> (SpaceApiServer, Router) {
    let config = ServerConfig::builder().api_key(KEY).build();
    let server = SpaceApiServer::new(config, document());
    let app = server.router();
    (server, app)
}

async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn post(app: &Router, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {KEY}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn document_json(server: &SpaceApiServer) -> String {
    serde_json::to_string(&server.store().snapshot().await).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_server, app) = setup();

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_get_document_on_both_paths() {
    let (_server, app) = setup();

    for uri in ["/", "/api/space"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let body = body_json(response).await;
        assert_eq!(body["space"], "Test Space");
        assert_eq!(body["state"]["open"], true);
        assert_eq!(body["location"]["address"], "Somewhere 1");
        assert_eq!(body["events"].as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_partial_state_update() {
    let (server, app) = setup();

    let response = post(&app, "/api/space/state", r#"{"message":"B"}"#).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["open"], true);
    assert_eq!(body["message"], "B");
    assert_eq!(body["trigger_person"], "Bob");
    assert!(body["lastchange"].as_i64().unwrap() > 1000);

    let state = server.store().snapshot().await.state.unwrap();
    assert_eq!(state.message.as_deref(), Some("B"));
    assert_eq!(state.trigger_person.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn test_state_update_closes_space() {
    let (_server, app) = setup();

    let response = post(
        &app,
        "/api/space/state",
        r#"{"open":false,"message":"","trigger_person":"Carol"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["open"], false);
    assert_eq!(body["message"], "A");
    assert_eq!(body["trigger_person"], "Carol");
}

#[tokio::test]
async fn test_people_upsert_by_location() {
    let (server, app) = setup();

    let response = post(&app, "/api/space/people", r#"{"value":5,"location":"Roof"}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    let readings = body_json(response).await;
    assert_eq!(readings.as_array().unwrap().len(), 2);

    let response = post(&app, "/api/space/people", r#"{"value":9,"location":"Roof"}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    let readings = body_json(response).await;
    let readings = readings.as_array().unwrap();
    assert_eq!(readings.len(), 2);

    let roof = readings
        .iter()
        .find(|r| r["location"] == "Roof")
        .unwrap();
    assert_eq!(roof["value"], 9);
    assert_eq!(roof["name"], "People Counter");

    let sensors = server.store().snapshot().await.sensors.unwrap();
    assert_eq!(sensors.people_now_present.len(), 2);
}

#[tokio::test]
async fn test_people_default_location_updates_existing_reading() {
    let (_server, app) = setup();

    let response = post(&app, "/api/space/people", r#"{"value":7}"#).await;
    assert_eq!(response.status(), StatusCode::OK);

    let readings = body_json(response).await;
    let readings = readings.as_array().unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0]["location"], "Main Space");
    assert_eq!(readings[0]["value"], 7);
    assert!(readings[0]["lastchange"].is_i64());
}

#[tokio::test]
async fn test_generic_sensor_category() {
    let (server, app) = setup();

    let response = post(
        &app,
        "/api/space/sensors/temperature",
        r#"{"value":21.5,"location":"Workshop"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let readings = body_json(response).await;
    assert_eq!(readings[0]["value"], 21.5);

    let sensors = server.store().snapshot().await.sensors.unwrap();
    assert_eq!(sensors.temperature.len(), 1);
    assert_eq!(sensors.people_now_present.len(), 1);
}

#[tokio::test]
async fn test_unknown_sensor_category() {
    let (server, app) = setup();
    let before = document_json(&server).await;

    let response = post(&app, "/api/space/sensors/flux_capacitor", r#"{"value":1}"#).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(document_json(&server).await, before);
}

#[tokio::test]
async fn test_event_append_keeps_most_recent() {
    let (server, app) = setup();

    for i in 0..12 {
        let body = format!(r#"{{"name":"event-{i}","type":"check-in","extra":"number {i}"}}"#);
        let response = post(&app, "/api/space/event", &body).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let events = server.store().snapshot().await.events;
    assert_eq!(events.len(), MAX_EVENTS);

    let names: Vec<String> = events.into_iter().map(|e| e.name).collect();
    let expected: Vec<String> = (2..12).map(|i| format!("event-{i}")).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_event_timestamp_is_server_assigned() {
    let (_server, app) = setup();

    let response = post(
        &app,
        "/api/space/event",
        r#"{"name":"alice","type":"check-in","timestamp":42}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let event = body_json(response).await;
    assert_eq!(event["name"], "alice");
    assert_eq!(event["type"], "check-in");
    assert!(event["timestamp"].as_i64().unwrap() > 42);
}

#[tokio::test]
async fn test_event_fields_default_to_empty() {
    let (server, app) = setup();

    let response = post(&app, "/api/space/event", r#"{"name":"alice"}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    let event = body_json(response).await;
    assert_eq!(event["name"], "alice");
    assert_eq!(event["type"], "");

    let response = post(&app, "/api/space/event", "{}").await;
    assert_eq!(response.status(), StatusCode::OK);
    let event = body_json(response).await;
    assert_eq!(event["name"], "");
    assert_eq!(event["type"], "");

    assert_eq!(server.store().snapshot().await.events.len(), 3);
}

#[tokio::test]
async fn test_malformed_json_leaves_document_unchanged() {
    let (server, app) = setup();
    let before = document_json(&server).await;

    for uri in [
        "/api/space/state",
        "/api/space/people",
        "/api/space/event",
        "/api/space/sensors/temperature",
    ] {
        let response = post(&app, uri, "{ not json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(document_json(&server).await, before, "{uri}");
    }
}

#[tokio::test]
async fn test_wrong_shape_is_rejected() {
    let (server, app) = setup();
    let before = document_json(&server).await;

    let cases = [
        ("/api/space/state", r#"{"open":"yes"}"#),
        ("/api/space/people", r#"{"value":"five"}"#),
        ("/api/space/people", r#"{"location":"Roof"}"#),
        ("/api/space/event", r#"{"name":7}"#),
        ("/api/space/event", "[]"),
    ];

    for (uri, body) in cases {
        let response = post(&app, uri, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
    }

    assert_eq!(document_json(&server).await, before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_are_serialized() {
    let (server, app) = setup();

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let body = format!(r#"{{"name":"e{i}","type":"check-in"}}"#);
                post(&app, "/api/space/event", &body).await.status()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(server.store().snapshot().await.events.len(), MAX_EVENTS);
}
