//! Client sync agent for the Porchlight counter.
//!
//! Every viewer or control device runs one [`SyncAgent`] against the sync
//! server's HTTP boundary. The agent:
//!
//! - Connects to the server's `/events` SSE endpoint and receives an
//!   initial snapshot followed by live updates
//! - Automatically reconnects with exponential backoff on disconnection
//! - Applies increments optimistically for low perceived latency, then
//!   reconciles against the authoritative pushes (the server's snapshot
//!   always wins)
//! - Publishes its state through a [`tokio::sync::watch`] channel so an
//!   embedding UI observes every change without polling
//!
//! # Example
//!
//! ```no_run
//! use porchlight_agent::SyncAgent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agent = SyncAgent::connect("http://192.168.1.20:3000");
//!     let mut updates = agent.subscribe();
//!     updates.changed().await?;
//!     if let Some(snapshot) = updates.borrow().local() {
//!         println!("visitors so far: {}", snapshot.current_count);
//!     }
//!     agent.increment().await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod backoff;
pub mod error;
pub mod sse;
pub mod sync;

// Re-export main types
pub use agent::SyncAgent;
pub use backoff::ReconnectPolicy;
pub use error::AgentError;
pub use sse::SseFrameDecoder;
pub use sync::{ConnectionStatus, SyncState};
