//! REST endpoint handlers for the sync server.
//!
//! All handlers go through the shared [`AppState`]; mutations broadcast
//! their new snapshot to every open push channel before responding.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/state` | Full counter state |
//! | `POST` | `/increment` | Count one visitor |
//! | `POST` | `/settings` | Overwrite count and/or candy baseline |
//!
//! The push channel itself (`GET /events`) lives in [`crate::sse`].

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use porchlight_core::{CounterState, SettingsUpdate};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response body for `POST /increment`.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementResponse {
    /// The visitor count after this increment.
    pub current_count: u64,
    /// The candy gauge after this increment.
    pub candy_remaining: u64,
}

/// Response body for a successful `POST /settings`.
#[derive(Debug, serde::Serialize)]
pub struct SettingsResponse {
    /// Always `true`; malformed payloads never reach this response.
    pub success: bool,
    /// The full counter state after the overwrite.
    pub state: CounterState,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the live counter and the API surface.
///
/// This stands in for the full dashboard, which is rendered by separate
/// viewer devices; the page is useful when checking the server from a
/// browser on the same network.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let counter = state.state().await;
    let viewers = state.viewer_count();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Porchlight</title>
    <style>
        body {{
            background: #140a1e;
            color: #e8dcc8;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 720px;
            margin: 0 auto;
        }}
        h1 {{ color: #ff9b2f; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b7e9e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #1e1230;
            border: 1px solid #3d2b52;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b7e9e; font-size: 0.85rem; }}
        .metric .value {{ color: #ff9b2f; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #ff9b2f; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #3d2b52; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Porchlight</h1>
    <p class="subtitle">Trick-or-treat counter sync server</p>

    <div>
        <div class="metric">
            <div class="label">Visitors</div>
            <div class="value">{count}</div>
        </div>
        <div class="metric">
            <div class="label">Candy</div>
            <div class="value">{candy}/{baseline}</div>
        </div>
        <div class="metric">
            <div class="label">Viewers</div>
            <div class="value">{viewers}</div>
        </div>
    </div>

    <hr>

    <h2>API</h2>
    <ul>
        <li>GET <a href="/state">/state</a> -- full counter state</li>
        <li>GET <a href="/events">/events</a> -- live snapshot stream (SSE)</li>
        <li>POST /increment -- count one visitor</li>
        <li>POST /settings -- overwrite count / candy baseline</li>
    </ul>
</body>
</html>"#,
        count = counter.current_count,
        candy = counter.candy_remaining,
        baseline = counter.initial_candy_count,
    ))
}

// ---------------------------------------------------------------------------
// GET /state -- full counter state
// ---------------------------------------------------------------------------

/// Return the full counter state. Read-only; no broadcast.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<CounterState> {
    Json(state.state().await)
}

// ---------------------------------------------------------------------------
// POST /increment -- count one visitor
// ---------------------------------------------------------------------------

/// Count one visitor.
///
/// Always succeeds. The new snapshot is broadcast to every open push
/// channel before this response is produced.
pub async fn increment(State(state): State<Arc<AppState>>) -> Json<IncrementResponse> {
    let snapshot = state.increment().await;
    Json(IncrementResponse {
        current_count: snapshot.current_count,
        candy_remaining: snapshot.candy_remaining,
    })
}

// ---------------------------------------------------------------------------
// POST /settings -- overwrite count and/or candy baseline
// ---------------------------------------------------------------------------

/// Apply a settings overwrite from the control panel.
///
/// The body must parse as JSON; otherwise the request is rejected with
/// `400 {"error":"Invalid data"}` and no mutation or broadcast happens.
/// Within a parseable body, fields that are absent or not non-negative
/// integers are ignored rather than rejected.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SettingsResponse>, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "rejected malformed settings payload");
        ApiError::InvalidBody
    })?;

    let update = SettingsUpdate::from_json(&value);
    let new_state = state.apply_settings(update).await;

    Ok(Json(SettingsResponse {
        success: true,
        state: new_state,
    }))
}
