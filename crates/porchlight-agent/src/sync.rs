//! The client-side synchronization state machine.
//!
//! [`SyncState`] is a pure struct: the agent's network loop drives it and
//! publishes it through a watch channel, but every transition here is
//! synchronous and independently testable.
//!
//! # Connection state machine
//!
//! ```text
//! Disconnected --start--> Connecting --first message--> Connected
//!      Connected --error/close--> Reconnecting --backoff--> Connecting
//! ```
//!
//! # Reconciliation policy
//!
//! The pushed snapshot is always authoritative: it overwrites the local
//! mirror unconditionally, including any optimistic value. An optimistic
//! increment that the server rejects is rolled back to the *most recent*
//! authoritative snapshot -- not the pre-optimistic value, since other
//! devices' mutations may have landed in the interim.

use porchlight_core::CounterSnapshot;

/// Status of the push-channel subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection and none in progress (initial state).
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The channel is open and the first snapshot has arrived.
    Connected,
    /// The channel dropped; waiting out the backoff delay.
    Reconnecting,
}

/// Mirror of the counter state on one device, plus connection bookkeeping.
#[derive(Debug, Clone)]
pub struct SyncState {
    local: Option<CounterSnapshot>,
    last_authoritative: Option<CounterSnapshot>,
    status: ConnectionStatus,
    reconnect_attempt: u32,
    just_incremented: bool,
    candy_per_child: u64,
}

impl SyncState {
    /// Fresh state: disconnected, no snapshot yet, one candy per child.
    pub const fn new() -> Self {
        Self {
            local: None,
            last_authoritative: None,
            status: ConnectionStatus::Disconnected,
            reconnect_attempt: 0,
            just_incremented: false,
            candy_per_child: 1,
        }
    }

    /// The local mirror of the counter, if any snapshot has been seen.
    pub const fn local(&self) -> Option<CounterSnapshot> {
        self.local
    }

    /// The most recent snapshot received from the push channel.
    pub const fn last_authoritative(&self) -> Option<CounterSnapshot> {
        self.last_authoritative
    }

    /// Current connection status.
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Number of consecutive failed connection attempts.
    pub const fn reconnect_attempt(&self) -> u32 {
        self.reconnect_attempt
    }

    /// Transient flag set by an optimistic increment, cleared by the next
    /// authoritative push or revert. Presentation-only (drives the "just
    /// counted" animation on viewers).
    pub const fn just_incremented(&self) -> bool {
        self.just_incremented
    }

    /// A connection attempt is starting.
    pub const fn begin_connect(&mut self) {
        self.status = ConnectionStatus::Connecting;
    }

    /// The channel is live: the first message arrived. Resets the attempt
    /// counter so the next outage starts from the base delay.
    pub const fn mark_connected(&mut self) {
        self.status = ConnectionStatus::Connected;
        self.reconnect_attempt = 0;
    }

    /// The channel dropped or the attempt failed.
    ///
    /// Moves to `Reconnecting` and bumps the attempt counter; returns the
    /// new counter for the backoff policy. The local mirror is kept -- a
    /// disconnected viewer keeps showing the last known state.
    pub const fn connection_lost(&mut self) -> u32 {
        self.status = ConnectionStatus::Reconnecting;
        self.reconnect_attempt = self.reconnect_attempt.saturating_add(1);
        self.reconnect_attempt
    }

    /// Apply an authoritative snapshot from the push channel.
    ///
    /// Overwrites the local mirror unconditionally; the push always wins
    /// over any optimistic value.
    pub const fn apply_push(&mut self, snapshot: CounterSnapshot) {
        self.local = Some(snapshot);
        self.last_authoritative = Some(snapshot);
        self.just_incremented = false;
    }

    /// Apply an optimistic increment to the local mirror.
    ///
    /// Uses the same arithmetic as the server so the eventual
    /// authoritative push is a no-op overwrite in the common case.
    /// Returns the optimistic snapshot, or `None` when no snapshot has
    /// been received yet (nothing to base the arithmetic on).
    pub const fn optimistic_increment(&mut self) -> Option<CounterSnapshot> {
        match self.local {
            Some(snapshot) => {
                let optimistic = snapshot.incremented(self.candy_per_child);
                self.local = Some(optimistic);
                self.just_incremented = true;
                Some(optimistic)
            }
            None => None,
        }
    }

    /// Roll the local mirror back to the last authoritative snapshot.
    ///
    /// Called when the mutation request behind an optimistic increment
    /// fails. Deliberately not the pre-optimistic value: if another
    /// device's mutation was pushed meanwhile, that newer state is what
    /// we revert to.
    pub const fn revert_to_authoritative(&mut self) {
        self.local = self.last_authoritative;
        self.just_incremented = false;
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const fn snapshot(count: u64, candy: u64) -> CounterSnapshot {
        CounterSnapshot {
            current_count: count,
            candy_remaining: candy,
            initial_candy_count: 100,
        }
    }

    #[test]
    fn starts_disconnected_with_no_state() {
        let state = SyncState::new();
        assert_eq!(state.status(), ConnectionStatus::Disconnected);
        assert!(state.local().is_none());
        assert_eq!(state.reconnect_attempt(), 0);
    }

    #[test]
    fn walks_the_connection_state_machine() {
        let mut state = SyncState::new();

        state.begin_connect();
        assert_eq!(state.status(), ConnectionStatus::Connecting);

        state.mark_connected();
        assert_eq!(state.status(), ConnectionStatus::Connected);

        let attempt = state.connection_lost();
        assert_eq!(state.status(), ConnectionStatus::Reconnecting);
        assert_eq!(attempt, 1);

        state.begin_connect();
        assert_eq!(state.status(), ConnectionStatus::Connecting);
    }

    #[test]
    fn repeated_failures_grow_the_attempt_counter() {
        let mut state = SyncState::new();
        assert_eq!(state.connection_lost(), 1);
        assert_eq!(state.connection_lost(), 2);
        assert_eq!(state.connection_lost(), 3);
    }

    #[test]
    fn successful_connection_resets_the_attempt_counter() {
        let mut state = SyncState::new();
        let _ = state.connection_lost();
        let _ = state.connection_lost();
        state.mark_connected();
        assert_eq!(state.reconnect_attempt(), 0);
        assert_eq!(state.connection_lost(), 1);
    }

    #[test]
    fn push_populates_both_mirrors() {
        let mut state = SyncState::new();
        state.apply_push(snapshot(4, 96));
        assert_eq!(state.local().unwrap().current_count, 4);
        assert_eq!(state.last_authoritative().unwrap().current_count, 4);
    }

    #[test]
    fn optimistic_increment_uses_the_server_formula() {
        let mut state = SyncState::new();
        state.apply_push(snapshot(4, 96));

        let optimistic = state.optimistic_increment().unwrap();
        assert_eq!(optimistic.current_count, 5);
        assert_eq!(optimistic.candy_remaining, 95);
        assert!(state.just_incremented());
    }

    #[test]
    fn optimistic_increment_without_a_snapshot_is_a_no_op() {
        let mut state = SyncState::new();
        assert!(state.optimistic_increment().is_none());
        assert!(state.local().is_none());
    }

    #[test]
    fn push_always_overwrites_the_optimistic_value() {
        let mut state = SyncState::new();
        state.apply_push(snapshot(4, 96));
        let _ = state.optimistic_increment();

        // The authoritative push wins even when it disagrees.
        state.apply_push(snapshot(9, 91));
        assert_eq!(state.local().unwrap().current_count, 9);
        assert!(!state.just_incremented());
    }

    #[test]
    fn revert_restores_the_latest_authoritative_snapshot() {
        let mut state = SyncState::new();
        state.apply_push(snapshot(3, 97));

        // Another device's mutation lands before our optimistic attempt.
        state.apply_push(snapshot(5, 95));
        let optimistic = state.optimistic_increment().unwrap();
        assert_eq!(optimistic.current_count, 6);

        // The increment request fails: roll back to 5, not 3.
        state.revert_to_authoritative();
        assert_eq!(state.local().unwrap().current_count, 5);
        assert!(!state.just_incremented());
    }

    #[test]
    fn disconnect_keeps_the_local_mirror() {
        let mut state = SyncState::new();
        state.apply_push(snapshot(8, 92));
        let _ = state.connection_lost();
        assert_eq!(state.local().unwrap().current_count, 8);
    }
}
