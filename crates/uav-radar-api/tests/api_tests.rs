//! Integration tests for the radar API endpoints.
//!
//! HTTP tests drive the Axum `Router` directly via `tower::ServiceExt`
//! without starting a TCP server. The track stream test serves the router on
//! a loopback port and connects a real WebSocket client.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::StreamExt;
use serde_json::Value;
use tokio_test::assert_ok;
use tower::ServiceExt;
use uav_radar_api::{AppState, build_router};
use uav_simulator::{SimulationConfig, Simulator};
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

fn make_state() -> (Simulator, AppState) {
    let mut simulator = assert_ok!(Simulator::new(SimulationConfig {
        seed: Some(11),
        ..SimulationConfig::default()
    }));
    assert_ok!(simulator.seed_population());
    let state = AppState::from_simulator(&simulator);
    (simulator, state)
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
    let app = build_router(state.clone(), &["*".to_string()]);
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_reports_population() {
    let (_sim, state) = make_state();
    let (status, body) = get(&state, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["uavCount"], 5);
    assert_eq!(body["subscribers"], 0);
}

#[tokio::test]
async fn test_health_has_no_side_effects() {
    let (sim, state) = make_state();
    let before = sim.store().all();
    get(&state, "/api/health").await;
    get(&state, "/api/health").await;
    assert_eq!(sim.store().all(), before);
}

#[tokio::test]
async fn test_zone_endpoint() {
    let (_sim, state) = make_state();
    let (status, body) = get(&state, "/api/zone").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["radius"], 2000.0);
    assert_eq!(body["altitude"], 200.0);
}

#[tokio::test]
async fn test_list_and_get_uavs() {
    let (sim, state) = make_state();
    let (status, body) = get(&state, "/api/uavs").await;

    assert_eq!(status, StatusCode::OK);
    let tracks = body.as_array().unwrap();
    assert_eq!(tracks.len(), 5);
    assert!(tracks[0].get("isDangerous").is_some());

    let id = sim.store().ids()[0];
    let (status, body) = get(&state, &format!("/api/uavs/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.to_string());
}

#[tokio::test]
async fn test_unknown_uav_is_not_found() {
    let (_sim, state) = make_state();
    let (status, body) = get(&state, &format!("/api/uavs/{}", Uuid::new_v4())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_uav_id_is_rejected() {
    let (_sim, state) = make_state();
    let (status, _) = get(&state, "/api/uavs/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plain_get_on_stream_is_rejected_without_subscribing() {
    let (sim, state) = make_state();
    let (status, _) = get(&state, "/socket.io").await;

    assert!(status.is_client_error());
    assert_eq!(sim.broadcaster().subscriber_count(), 0);
}

#[tokio::test]
async fn test_root_banner() {
    let (_sim, state) = make_state();
    let app = build_router(state, &[]);
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_alias() {
    let (_sim, state) = make_state();
    let (status, body) = get(&state, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uavCount"], 5);
}

#[tokio::test]
async fn test_track_stream_replays_snapshot_and_unsubscribes_on_close() {
    let (sim, state) = make_state();
    let broadcaster = sim.broadcaster();
    let app = build_router(state, &[]);

    let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
    let addr = assert_ok!(listener.local_addr());
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let (mut socket, _) = assert_ok!(
        tokio_tungstenite::connect_async(format!("ws://{addr}/socket.io")).await
    );

    let mut seen = Vec::new();
    for _ in 0..5 {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("snapshot frame before timeout")
            .expect("stream still open")
            .expect("valid frame");
        let text = match frame {
            Message::Text(text) => text,
            other => panic!("expected a text frame, got {other:?}"),
        };
        let event: Value = serde_json::from_str(text.as_str()).unwrap();
        let id = event["UavUpdate"]["id"].as_str().expect("UavUpdate frame");
        seen.push(id.parse::<Uuid>().unwrap());
    }
    seen.sort();
    assert_eq!(seen, sim.store().ids());
    assert_eq!(broadcaster.subscriber_count(), 1);

    assert_ok!(socket.close(None).await);
    while let Ok(Some(Ok(_))) =
        tokio::time::timeout(Duration::from_secs(1), socket.next()).await
    {}

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while broadcaster.subscriber_count() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(broadcaster.subscriber_count(), 0);

    server.abort();
}
