//! Core counter state for the Porchlight trick-or-treat counter.
//!
//! This crate holds the single authoritative [`CounterState`] and the rules
//! for mutating it. The server wraps a [`StateStore`] behind its
//! serialization point; the sync agent reuses the same arithmetic for its
//! optimistic local updates so both sides always converge on the same
//! values.
//!
//! # Design Principles
//!
//! - All counter arithmetic is saturating -- the visitor count can only
//!   grow monotonically under `increment`, and the candy gauge clamps at
//!   zero instead of going negative.
//! - [`CounterSnapshot`] is the wire projection pushed to viewers; it is
//!   a strict subset of [`CounterState`] and is always an immutable copy.
//! - Settings writes are lenient: fields that are absent or not
//!   representable as non-negative integers are ignored, never errors.

pub mod store;

pub use store::{CounterSnapshot, CounterState, SettingsUpdate, StateStore};
