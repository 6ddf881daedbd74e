//! Message Aggregator Module
//!
//! This module reassembles the chunk stream produced by the connection
//! readers into complete HTTP request messages.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐        ┌──────────────────────────────┐
//! │ Reader 0 │──>│          │        │          Aggregator          │
//! ├──────────┤   │  shared  │        │                              │
//! │ Reader 1 │──>│   mpsc   │───────>│  HashMap<id, Assembly>       │
//! ├──────────┤   │  queue   │        │  (single owner, no locks)    │
//! │ Reader N │──>│          │        │                              │
//! └──────────┘   └──────────┘        └──────────────┬───────────────┘
//!                                                   │ FramedMessage
//!                                                   ▼
//!                                        parse ──> route ──> respond
//! ```
//!
//! Single-threadedness is deliberate: exactly one task owns every
//! per-connection buffer, so the map is mutated without any locking. The
//! invariant is visible in the design (message passing into one task)
//! rather than enforced by a mutex.
//!
//! ## Modules
//!
//! - `assembler`: the per-connection framing state machine
//! - `engine`: the aggregator task, event types and response writing

pub mod assembler;
pub mod engine;

// Re-export commonly used types
pub use assembler::Assembly;
pub use engine::{Aggregator, ConnectionEvent};
