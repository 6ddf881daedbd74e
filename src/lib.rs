//! # FeatherHTTP - A Bare-Socket HTTP/1.1 Server
//!
//! FeatherHTTP is a minimal HTTP/1.1 server written directly against TCP
//! sockets. It demonstrates systems programming concepts like stream
//! framing, message reassembly, and task lifecycle management — there is no
//! HTTP library underneath, the protocol is parsed by hand.
//!
//! ## Features
//!
//! - **Hand-Rolled Framing**: message boundaries are found by searching the
//!   byte stream, never by a parser library
//! - **Single-Owner Aggregation**: one task owns all per-connection
//!   buffers, so reassembly needs no locks
//! - **Per-Connection Error Isolation**: a misbehaving client gets a `4xx`
//!   and a closed connection, never a dead server
//! - **Async I/O**: built on Tokio for handling thousands of concurrent
//!   connections
//! - **Graceful Shutdown**: readers are joined and queued chunks drained
//!   before the process exits
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                             FeatherHTTP                              │
//! │                                                                      │
//! │  ┌────────────┐ accept ┌────────────┐  chunks   ┌────────────────┐   │
//! │  │  Acceptor  │───────>│  Reader    │──────────>│                │   │
//! │  │ (listener) │        │ (per conn) │  shared   │   Aggregator   │   │
//! │  └────────────┘        └────────────┘  queue    │ (single owner  │   │
//! │        │                  ... xN                │  of buffers)   │   │
//! │        │ shutdown watch                         └───────┬────────┘   │
//! │        ▼                                                │ complete   │
//! │  ┌────────────┐                                         ▼            │
//! │  │ Supervisor │                              ┌────────────────────┐  │
//! │  │ (joins all │                              │ Parser ──> Router  │  │
//! │  │  readers)  │                              │  ──> respond+close │  │
//! │  └────────────┘                              └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use featherhttp::router::Router;
//! use featherhttp::server::Server;
//! use tokio::net::TcpListener;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:4221").await?;
//!     let (shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     // Flip shutdown_tx to true from a signal handler to stop cleanly.
//!     let server = Server::new(listener, Router::new("."));
//!     server.run(shutdown_rx).await
//! }
//! ```
//!
//! ## Routes
//!
//! - `GET /` - bare `200 OK`
//! - `GET /user-agent` - echoes the `User-Agent` header
//! - `GET /echo/<value>` - echoes `<value>` as `text/plain`
//! - `GET /files/<name>` - serves a file from the configured directory
//! - `POST /files/<name>` - writes the request body to a file
//!
//! One request per connection: the connection is always closed after the
//! response. Keep-alive, pipelining, chunked transfer-encoding, TLS and
//! HTTP/2 are out of scope.
//!
//! ## Module Overview
//!
//! - [`connection`]: per-connection reader tasks and statistics
//! - [`aggregator`]: chunk reassembly and request dispatch
//! - [`protocol`]: message types and the pure request parser
//! - [`router`]: the static route table and its handlers
//! - [`server`]: the acceptor and lifecycle supervisor
//!
//! ## Design Highlights
//!
//! ### Framing Without Locks
//!
//! Readers push tagged chunks onto one shared queue; a single aggregator
//! task consumes it and owns every per-connection buffer. Exclusive
//! ownership is structural (message passing into one task), so the buffer
//! map is mutated with no synchronization at all.
//!
//! ### Chunking-Independent Reassembly
//!
//! The framing state machine produces the same message whether the bytes
//! arrive one at a time or in a single burst. Once the header terminator
//! is found, the header block is scanned exactly once; body completion is
//! a pure length comparison.
//!
//! ### Bounded-Latency Cancellation
//!
//! Reads never block for more than the idle deadline, so every reader
//! observes the shutdown flag within ten seconds and the supervisor joins
//! them all before the process exits.

pub mod aggregator;
pub mod connection;
pub mod protocol;
pub mod router;
pub mod server;

// Re-export commonly used types for convenience
pub use aggregator::{Aggregator, Assembly, ConnectionEvent};
pub use connection::{ConnectionReader, ConnectionStats};
pub use protocol::{parse_request, FramingError, Request, Response, Status};
pub use router::Router;
pub use server::Server;

/// The default port FeatherHTTP listens on
pub const DEFAULT_PORT: u16 = 4221;

/// The default host FeatherHTTP binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of FeatherHTTP
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
