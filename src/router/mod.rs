//! Router Module
//!
//! This module maps parsed requests to response-producing handlers.
//!
//! ## Architecture
//!
//! ```text
//! ParsedRequest
//!       │
//!       ▼
//! ┌─────────────────┐
//! │     Router      │  (this module)
//! │                 │
//! │  - match path   │
//! │  - run handler  │
//! └────────┬────────┘
//!          │
//!          ▼
//!      Response
//! ```
//!
//! The route set is static: it is built once at startup from the configured
//! working directory and never changes. Each request is dispatched exactly
//! once, by the aggregator, and the connection is closed after the response
//! regardless of outcome.

pub mod handler;

// Re-export the router
pub use handler::Router;
