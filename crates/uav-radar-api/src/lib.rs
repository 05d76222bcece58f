//! # UAV Radar API
//!
//! HTTP/WebSocket front for the UAV radar simulation.
//!
//! ## Features
//!
//! - **Track stream**: snapshot-then-live UAV events over WebSocket
//! - **Health**: population and observer counts
//! - **Read-only queries**: radar zone and current UAV tracks
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Axum HTTP Server                         │
//! │          (/socket.io WebSocket, /api/* JSON routes)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        AppState                             │
//! │              (UavStore, Broadcaster, Zone)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//!                              │ events
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Simulator (background task)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod ws;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, Method},
    routing::get,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uav_domain::{Uav, Zone};
use uav_simulator::{SharedBroadcaster, SharedUavStore, Simulator};
use uuid::Uuid;

pub use config::{Config, ConfigError};
pub use error::{ApiError, ApiResult};

/// Application state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedUavStore,
    pub broadcaster: SharedBroadcaster,
    pub zone: Zone,
}

impl AppState {
    /// Share the simulator's store and broadcaster with the HTTP layer.
    pub fn from_simulator(simulator: &Simulator) -> Self {
        Self {
            store: simulator.store(),
            broadcaster: simulator.broadcaster(),
            zone: simulator.config().zone,
        }
    }
}

/// Health check body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uav_count: usize,
    pub subscribers: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uav_count: state.store.len(),
        subscribers: state.broadcaster.subscriber_count(),
    })
}

/// Radar zone geometry
pub async fn zone(State(state): State<AppState>) -> Json<Zone> {
    Json(state.zone)
}

/// Current UAV tracks
pub async fn list_uavs(State(state): State<AppState>) -> Json<Vec<Uav>> {
    Json(state.store.all())
}

/// Single UAV track
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if no UAV has this id.
pub async fn get_uav(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Uav>> {
    state.store.get(&id).map(Json).ok_or_else(|| ApiError::NotFound {
        entity_type: "Uav".to_string(),
        id: id.to_string(),
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Build the Axum router
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Track stream
        .route("/socket.io", get(ws::ws_tracks))
        .route("/ws", get(ws::ws_tracks))
        // Read-only API
        .route("/api/health", get(health_check))
        .route("/health", get(health_check))
        .route("/api/zone", get(zone))
        .route("/api/uavs", get(list_uavs))
        .route("/api/uavs/{id}", get(get_uav))
        .route("/", get(|| async { "UAV Radar Simulator" }))
        // State and middleware
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
