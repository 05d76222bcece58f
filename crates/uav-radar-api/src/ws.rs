//! `WebSocket` handler for real-time UAV track streaming.
//!
//! Clients connect to `GET /socket.io` (or `GET /ws`). The connection is
//! registered with the broadcaster before the upgrade completes, so the
//! first frames a client sees are the current UAV snapshot, followed by live
//! `UavUpdate` / `UavRemove` events as JSON text frames.
//!
//! A client that stops reading is dropped by the broadcaster once its buffer
//! fills; its socket is then closed here.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use tracing::{debug, info, trace, warn};
use uav_simulator::{SharedBroadcaster, Subscription};

use crate::AppState;
use crate::error::ApiResult;

/// Register an observer and upgrade the connection.
///
/// # Route
///
/// `GET /socket.io`
pub async fn ws_tracks(ws: WebSocketUpgrade, State(state): State<AppState>) -> ApiResult<Response> {
    let subscription = state.broadcaster.subscribe()?;
    let broadcaster = state.broadcaster.clone();
    Ok(ws.on_upgrade(move |socket| stream_tracks(socket, subscription, broadcaster)))
}

/// Forward events to the socket until either side goes away.
async fn stream_tracks(
    mut socket: WebSocket,
    mut subscription: Subscription,
    broadcaster: SharedBroadcaster,
) {
    let id = subscription.id();
    info!(subscriber = id, "Observer connected");

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    debug!(subscriber = id, "Subscription closed by broadcaster");
                    break;
                };
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!(
                            subscriber = id,
                            kind = event.kind(),
                            uav = %event.uav_id(),
                            "Failed to serialize UAV event: {e}"
                        );
                        continue;
                    }
                };
                trace!(
                    subscriber = id,
                    kind = event.kind(),
                    uav = %event.uav_id(),
                    "Forwarding event"
                );
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(subscriber = id, "Observer disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(subscriber = id, "Observer closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(subscriber = id, "Observer disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(subscriber = id, "WebSocket error: {e}");
                        break;
                    }
                    // Inbound text/binary is ignored
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    subscription.close();
    broadcaster.unsubscribe(id);
    info!(subscriber = id, "Observer disconnected");
}
