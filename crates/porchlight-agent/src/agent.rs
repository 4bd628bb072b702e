//! The sync agent: push-channel subscription plus mutation calls.
//!
//! [`SyncAgent`] owns a background task that keeps the SSE subscription
//! alive (reconnecting with exponential backoff) and a watch channel
//! publishing the [`SyncState`] after every change. Mutation calls run
//! concurrently with the subscription; the authoritative pushes reconcile
//! whatever they produce.

use std::sync::Arc;

use futures::StreamExt;
use porchlight_core::{CounterSnapshot, CounterState, SettingsUpdate};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backoff::ReconnectPolicy;
use crate::error::AgentError;
use crate::sse::SseFrameDecoder;
use crate::sync::{ConnectionStatus, SyncState};

/// Shared internals between the agent handle and its background task.
struct AgentInner {
    client: reqwest::Client,
    base_url: String,
    state: watch::Sender<SyncState>,
    policy: ReconnectPolicy,
}

/// Acknowledgment body of a successful `POST /settings`.
#[derive(Debug, serde::Deserialize)]
struct SettingsAck {
    #[allow(dead_code)]
    success: bool,
    state: CounterState,
}

/// Acknowledgment body of a successful `POST /increment`.
///
/// A strict subset of the snapshot; the wire format omits the baseline
/// here.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncrementAck {
    current_count: u64,
    #[allow(dead_code)]
    candy_remaining: u64,
}

/// A live synchronization session with one sync server.
///
/// Dropping the agent (or calling [`shutdown`](Self::shutdown)) aborts
/// the background subscription task, which closes the push channel and
/// cancels any pending backoff sleep.
pub struct SyncAgent {
    inner: Arc<AgentInner>,
    task: JoinHandle<()>,
}

impl SyncAgent {
    /// Start a session against `base_url` (e.g. `http://host:3000`).
    ///
    /// The subscription task starts immediately; subscribe to the watch
    /// channel to observe the connection coming up and snapshots landing.
    pub fn connect(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let (state, _) = watch::channel(SyncState::new());
        let inner = Arc::new(AgentInner {
            client: reqwest::Client::new(),
            base_url,
            state,
            policy: ReconnectPolicy::default(),
        });

        let task = tokio::spawn(run_subscription(Arc::clone(&inner)));

        Self { inner, task }
    }

    /// Subscribe to state changes.
    ///
    /// The receiver yields after every transition: connection status
    /// changes, authoritative pushes, optimistic updates, and reverts.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// A copy of the current sync state.
    pub fn current(&self) -> SyncState {
        self.inner.state.borrow().clone()
    }

    /// Count one visitor, optimistically.
    ///
    /// The local mirror is incremented immediately (same arithmetic as
    /// the server); the request then runs in the background of the
    /// user's perception. On failure the mirror is rolled back to the
    /// last authoritative snapshot. On success nothing further happens
    /// here -- the authoritative push overwrites the mirror with the same
    /// value.
    pub async fn increment(&self) -> Result<(), AgentError> {
        self.inner.state.send_modify(|s| {
            let _ = s.optimistic_increment();
        });

        let url = format!("{}/increment", self.inner.base_url);
        let result = async {
            let response = self.inner.client.post(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("unable to read error body"));
                return Err(AgentError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            let ack: IncrementAck = serde_json::from_slice(&response.bytes().await?)?;
            Ok(ack)
        }
        .await;

        match result {
            Ok(ack) => {
                // No reconciliation needed: the authoritative push lands
                // with the same arithmetic and overwrites the mirror.
                debug!(count = ack.current_count, "increment acknowledged");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "increment failed, reverting to authoritative state");
                self.inner
                    .state
                    .send_modify(SyncState::revert_to_authoritative);
                Err(error)
            }
        }
    }

    /// Overwrite the count and/or candy baseline (control-panel surface).
    ///
    /// Not optimistic: the authoritative push triggered by the server's
    /// broadcast reconciles every viewer, including this one.
    pub async fn update_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<CounterState, AgentError> {
        let url = format!("{}/settings", self.inner.base_url);
        let response = self.inner.client.post(&url).json(&update).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unable to read error body"));
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let ack: SettingsAck = serde_json::from_slice(&response.bytes().await?)?;
        Ok(ack.state)
    }

    /// Fetch the full counter state once, outside the push channel.
    pub async fn fetch_state(&self) -> Result<CounterState, AgentError> {
        let url = format!("{}/state", self.inner.base_url);
        let response = self.inner.client.get(&url).send().await?.error_for_status()?;
        let state: CounterState = serde_json::from_slice(&response.bytes().await?)?;
        Ok(state)
    }

    /// Tear the session down.
    ///
    /// Aborts the subscription task: the open channel is closed and any
    /// pending backoff timer is cancelled with it.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for SyncAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Keep the push-channel subscription alive for the life of the agent.
///
/// Each pass connects, streams until the channel ends or errors, then
/// waits out the backoff delay before trying again. The attempt counter
/// lives in [`SyncState`] and resets when a connection delivers its first
/// message.
async fn run_subscription(inner: Arc<AgentInner>) {
    loop {
        inner.state.send_modify(SyncState::begin_connect);

        match stream_events(&inner).await {
            Ok(()) => debug!("push channel closed by server"),
            Err(error) => debug!(%error, "push channel error"),
        }

        let mut attempt = 0;
        inner.state.send_modify(|s| {
            attempt = s.connection_lost();
        });

        let delay = inner.policy.delay(attempt);
        debug!(
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "reconnecting after backoff"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Stream one connection's worth of push messages into the sync state.
///
/// Returns `Ok(())` when the server closes the channel, or the transport
/// error that ended it. A message that fails to parse is logged and
/// skipped; the existing local state is kept and the connection stays up.
async fn stream_events(inner: &AgentInner) -> Result<(), AgentError> {
    let url = format!("{}/events", inner.base_url);
    let response = inner.client.get(&url).send().await?.error_for_status()?;

    let mut stream = response.bytes_stream();
    let mut decoder = SseFrameDecoder::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for payload in decoder.feed(&chunk) {
            match serde_json::from_str::<CounterSnapshot>(&payload) {
                Ok(snapshot) => {
                    inner.state.send_modify(|s| {
                        if s.status() != ConnectionStatus::Connected {
                            s.mark_connected();
                        }
                        s.apply_push(snapshot);
                    });
                }
                Err(error) => {
                    warn!(%error, "ignoring malformed push message");
                }
            }
        }
    }

    Ok(())
}
