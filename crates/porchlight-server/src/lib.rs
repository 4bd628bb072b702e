//! Sync server for the Porchlight trick-or-treat counter.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **SSE push channel** (`GET /events`) streaming counter snapshots to
//!   every connected viewer via [`tokio::sync::broadcast`], with a
//!   comment-only keepalive every 30 seconds
//! - **Mutation endpoints** (`POST /increment`, `POST /settings`) that
//!   write the authoritative [`StateStore`](porchlight_core::StateStore)
//!   and fan the new snapshot out to all viewers
//! - **Query endpoint** (`GET /state`) returning the full counter state
//! - **Minimal HTML status page** (`GET /`) showing the live count, the
//!   candy gauge, and the API surface
//!
//! # Architecture
//!
//! All mutations go through [`AppState`], which guards the store with a
//! single write lock and broadcasts the resulting snapshot *before*
//! releasing it -- so every viewer observes snapshots in exactly the order
//! mutations were applied, and a new subscriber's first frame always
//! equals `GET /state` at the same logical instant. Delivery is
//! best-effort: a slow viewer skips to the newest snapshot, a vanished
//! viewer is dropped without affecting the others.
//!
//! [`AppState`]: state::AppState

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod sse;
pub mod state;

// Re-export primary types for convenience.
pub use config::PorchlightConfig;
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
