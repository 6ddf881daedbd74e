//! Connection Handling Module
//!
//! This module owns the read side of every client connection. Each accepted
//! connection gets its own reader task; readers never parse anything, they
//! only forward tagged chunks to the single aggregator task.
//!
//! ## Lifecycle
//!
//! ```text
//! 1. Acceptor accepts, assigns the next connection id
//!        │
//!        ▼
//! 2. Write half registered with the aggregator
//!        │
//!        ▼
//! 3. Reader task spawned with the read half
//!        │
//!        ▼
//! 4. Chunks forwarded until EOF / close / shutdown / error
//!        │
//!        ▼
//! 5. Closed event emitted, task joins
//! ```
//!
//! The connection is closed exactly once, by the aggregator after it writes
//! the response (or tears the connection down on a framing error). The
//! reader observes that close through its per-connection signal and exits.

pub mod reader;

// Re-export commonly used types
pub use reader::{ConnectionReader, ConnectionStats, IDLE_READ_TIMEOUT, READ_BUFFER_SIZE};
