//! Relay endpoints: long-poll watch and fire-and-forget track.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Map, Value};

use veil_core::NotificationDispatcher;

use crate::assets::AssetDir;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The broker.
    pub dispatcher: Arc<NotificationDispatcher>,
    /// Static asset root.
    pub assets: Arc<AssetDir>,
}

/// Builds the relay router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/watch/{private_id}", get(watch))
        .route("/track/{public_id}/{event}", get(track))
        .route("/static/{*path}", get(crate::assets::serve))
        .with_state(state)
}

/// Headers shared by every relay response.
fn relay_headers() -> [(HeaderName, &'static str); 2] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::CACHE_CONTROL, "no-cache"),
    ]
}

/// `GET /watch/{private_id}` — hold the connection open until an event
/// arrives for the channel, then answer with the envelope.
///
/// If the client goes away first, the handler future is dropped; dropping
/// the wait handle removes the waiter from the registry.
async fn watch(State(state): State<AppState>, Path(private_id): Path<String>) -> Response {
    let mut handle = state.dispatcher.subscribe(&private_id);
    match handle.recv().await {
        Ok(envelope) => (relay_headers(), Json(envelope.as_ref().clone())).into_response(),
        // Only reachable if the waiter was cancelled out from under a
        // still-connected client; answer empty rather than fault.
        Err(_) => (StatusCode::NO_CONTENT, relay_headers()).into_response(),
    }
}

/// `GET /track/{public_id}/{event}` — publish an event to a pseudonym.
///
/// Query parameters become the event data as `name -> [values]` lists
/// (repeated names accumulate). Publishers always see `{"ok":true}`;
/// whether a waiter was actually reached stays invisible to them.
async fn track(
    State(state): State<AppState>,
    Path((public_id, event)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let mut data = Map::new();
    for (name, value) in params {
        let values = data.entry(name).or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = values {
            values.push(Value::String(value));
        }
    }

    state.dispatcher.publish(&public_id, &event, Value::Object(data));
    (relay_headers(), Json(json!({ "ok": true })))
}
