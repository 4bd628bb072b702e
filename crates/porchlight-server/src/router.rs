//! Axum router construction for the sync server.
//!
//! Assembles the REST and SSE routes into a single [`Router`] with
//! wildcard CORS, since viewers and the control panel are reached from
//! arbitrary devices on the same network.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::sse;
use crate::state::AppState;

/// Build the complete Axum router for the sync server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /events` -- SSE snapshot stream
/// - `POST /increment` -- count one visitor
/// - `POST /settings` -- overwrite count / candy baseline
/// - `GET /state` -- full counter state
///
/// CORS allows any origin (the service is meant for same-LAN multi-device
/// use); the layer also answers `OPTIONS` preflight requests with no
/// content.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Push channel
        .route("/events", get(sse::events))
        // Mutation + query API
        .route("/increment", post(handlers::increment))
        .route("/settings", post(handlers::update_settings))
        .route("/state", get(handlers::get_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
