//! SSE handler for the real-time snapshot push channel.
//!
//! Viewers connect to `GET /events` and receive a JSON-encoded
//! [`CounterSnapshot`](porchlight_core::CounterSnapshot) frame for every
//! mutation, preceded by one frame carrying the state at subscribe time --
//! a new viewer never waits for the next mutation to learn the count.
//!
//! Delivery is best-effort: if a viewer falls behind the broadcast
//! channel it skips to the newest snapshot (snapshots are absolute, so
//! nothing is lost), and a viewer whose connection drops is unregistered
//! by the stream going away. A comment-only keepalive is emitted every
//! 30 seconds so intermediaries do not reap the idle connection.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast;
use tracing::debug;

use crate::state::AppState;

/// Interval between comment-only keepalive frames.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Open the push channel and begin streaming counter snapshots.
///
/// # Route
///
/// `GET /events`
pub async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let guard = state.register_viewer();
    let (snapshot, rx) = state.subscribe_with_snapshot().await;

    // First frame: the state as of subscription, consistent with the
    // receiver (both were taken under the store's read lock).
    let initial = stream::once(async move { snapshot_event(&snapshot) });

    let updates = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    return Some((snapshot_event(&snapshot), (rx, guard)));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "viewer lagged, skipping to newest snapshot");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("broadcast channel closed, ending push channel");
                    return None;
                }
            }
        }
    });

    Sse::new(initial.chain(updates))
        .keep_alive(KeepAlive::new().interval(KEEPALIVE_INTERVAL).text("ping"))
}

/// Encode a snapshot as an SSE data frame.
///
/// Serialization of the snapshot cannot fail (plain integers), so the
/// stream item is infallible.
fn snapshot_event(snapshot: &porchlight_core::CounterSnapshot) -> Result<Event, Infallible> {
    let json = serde_json::to_string(snapshot).unwrap_or_default();
    Ok(Event::default().data(json))
}
