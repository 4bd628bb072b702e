//! Shared application state for the sync server.
//!
//! [`AppState`] is the broadcast hub: it owns the authoritative
//! [`StateStore`] behind a single write lock and the broadcast channel
//! that fans snapshots out to every open push channel. Mutations send on
//! the channel while still holding the write lock, which makes broadcast
//! order identical to mutation order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use porchlight_core::{CounterSnapshot, CounterState, SettingsUpdate, StateStore};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// Capacity of the broadcast channel for counter snapshots.
///
/// If a viewer falls behind by more than this many snapshots it receives
/// a [`broadcast::error::RecvError::Lagged`] and skips to the newest one,
/// which is always sufficient because snapshots are absolute, not deltas.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// store is the single serialization point for all mutations; the
/// broadcast sender pushes each new snapshot to all connected viewers.
pub struct AppState {
    /// The authoritative counter store, guarded by the mutation lock.
    store: RwLock<StateStore>,
    /// Broadcast sender for counter snapshots.
    tx: broadcast::Sender<CounterSnapshot>,
    /// Number of currently open push channels, for logging.
    viewers: AtomicUsize,
}

impl AppState {
    /// Create application state around an initial store.
    pub fn new(store: StateStore) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            store: RwLock::new(store),
            tx,
            viewers: AtomicUsize::new(0),
        }
    }

    /// Count one visitor and broadcast the new snapshot.
    ///
    /// The broadcast happens under the write lock, after the mutation is
    /// applied, so any viewer receiving it sees state at least as new as
    /// what the HTTP response reports.
    pub async fn increment(&self) -> CounterSnapshot {
        let mut store = self.store.write().await;
        let snapshot = store.increment();
        let _receivers = self.tx.send(snapshot).unwrap_or(0);
        info!(
            count = snapshot.current_count,
            candy = snapshot.candy_remaining,
            of = snapshot.initial_candy_count,
            "visitor counted"
        );
        snapshot
    }

    /// Apply a settings overwrite and broadcast the new snapshot.
    pub async fn apply_settings(&self, update: SettingsUpdate) -> CounterState {
        let mut store = self.store.write().await;
        let state = store.apply_settings(update);
        let _receivers = self.tx.send(store.snapshot()).unwrap_or(0);
        info!(
            count = state.current_count,
            candy = state.candy_remaining,
            of = state.initial_candy_count,
            "settings updated"
        );
        state
    }

    /// An immutable copy of the full counter state.
    pub async fn state(&self) -> CounterState {
        self.store.read().await.state()
    }

    /// Subscribe to the snapshot broadcast channel.
    ///
    /// Returns a receiver that yields every snapshot broadcast after this
    /// call. Used directly by tests; the SSE handler uses
    /// [`subscribe_with_snapshot`](Self::subscribe_with_snapshot) so the
    /// initial frame and the subscription are consistent.
    pub fn subscribe(&self) -> broadcast::Receiver<CounterSnapshot> {
        self.tx.subscribe()
    }

    /// Subscribe and take the current snapshot atomically.
    ///
    /// Both happen under the read lock, so no mutation (which needs the
    /// write lock to broadcast) can slip between them: the returned
    /// snapshot plus the receiver's stream observe every mutation exactly
    /// once, in order.
    pub async fn subscribe_with_snapshot(
        &self,
    ) -> (CounterSnapshot, broadcast::Receiver<CounterSnapshot>) {
        let store = self.store.read().await;
        let rx = self.tx.subscribe();
        (store.snapshot(), rx)
    }

    /// Register an open push channel for the viewer gauge.
    ///
    /// The returned guard decrements the gauge when dropped, so
    /// unsubscription is automatic and idempotent however the connection
    /// ends.
    pub fn register_viewer(self: &Arc<Self>) -> ViewerGuard {
        let total = self.viewers.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        info!(viewers = total, "viewer connected");
        ViewerGuard {
            state: Arc::clone(self),
        }
    }

    /// Number of currently open push channels.
    pub fn viewer_count(&self) -> usize {
        self.viewers.load(Ordering::Acquire)
    }
}

/// Drop guard tracking one open push channel.
///
/// Created by [`AppState::register_viewer`] and owned by the SSE response
/// stream; dropping the stream (client close, write failure, or server
/// shutdown) releases the guard.
pub struct ViewerGuard {
    state: Arc<AppState>,
}

impl Drop for ViewerGuard {
    fn drop(&mut self) {
        let remaining = self
            .state
            .viewers
            .fetch_sub(1, Ordering::AcqRel)
            .saturating_sub(1);
        debug!(viewers = remaining, "viewer disconnected");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_broadcasts_to_subscriber() {
        let state = AppState::new(StateStore::default());
        let mut rx = state.subscribe();

        let snapshot = state.increment().await;
        assert_eq!(snapshot.current_count, 1);
        assert_eq!(snapshot.candy_remaining, 99);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, snapshot);
    }

    #[tokio::test]
    async fn broadcasts_arrive_in_mutation_order() {
        let state = AppState::new(StateStore::default());
        let mut rx = state.subscribe();

        let _ = state.increment().await;
        let _ = state.increment().await;

        assert_eq!(rx.recv().await.unwrap().current_count, 1);
        assert_eq!(rx.recv().await.unwrap().current_count, 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn subscribe_with_snapshot_matches_state() {
        let state = AppState::new(StateStore::default());
        let _ = state.increment().await;

        let (snapshot, _rx) = state.subscribe_with_snapshot().await;
        let full = state.state().await;
        assert_eq!(snapshot.current_count, full.current_count);
        assert_eq!(snapshot.candy_remaining, full.candy_remaining);
    }

    #[tokio::test]
    async fn viewer_gauge_tracks_guards() {
        let state = Arc::new(AppState::new(StateStore::default()));
        assert_eq!(state.viewer_count(), 0);

        let first = state.register_viewer();
        let second = state.register_viewer();
        assert_eq!(state.viewer_count(), 2);

        drop(first);
        assert_eq!(state.viewer_count(), 1);
        drop(second);
        assert_eq!(state.viewer_count(), 0);
    }
}
