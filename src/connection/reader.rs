//! Connection Reader
//!
//! One reader task exists per accepted connection. It pulls raw bytes off
//! the wire with a bounded idle deadline and forwards them as tagged chunks
//! to the aggregator; it never interprets the bytes itself.
//!
//! ## Read Loop
//!
//! ```text
//! loop {
//!   read up to 4096 bytes, waiting at most 10s
//!     ├─ deadline expired ──> check shutdown flag, retry
//!     ├─ 0 bytes (EOF) ─────> stop silently
//!     ├─ n bytes ───────────> emit Chunk{id, payload}
//!     └─ I/O error ─────────> log, stop (this reader only)
//! }
//! ```
//!
//! The idle deadline is not an error: it exists so the task periodically
//! observes the process-wide shutdown flag, bounding cancellation latency
//! by the deadline. The reader also watches a per-connection close signal
//! held by the aggregator, so it exits promptly once the response has been
//! written instead of waiting out the deadline.

use crate::aggregator::ConnectionEvent;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time;
use tracing::{debug, trace, warn};

/// Size of the fixed read buffer; a single chunk is never larger than this.
pub const READ_BUFFER_SIZE: usize = 4096;

/// How long a read may block before the reader rechecks the shutdown flag.
pub const IDLE_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Statistics for connection handling.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total requests dispatched to the router
    pub requests_served: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn request_served(&self) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Reads one connection and forwards its bytes as chunks.
///
/// Generic over the stream type so the loop can be driven by scripted I/O
/// in tests; the server instantiates it with a `tcp::OwnedReadHalf`.
pub struct ConnectionReader<R> {
    /// Connection id, assigned at accept time and never reused
    id: u64,

    /// The read side of the connection
    stream: R,

    /// Peer address (for logging)
    addr: SocketAddr,

    /// Shared event queue into the aggregator
    events: mpsc::Sender<ConnectionEvent>,

    /// Process-wide shutdown flag, polled on idle-deadline wakes
    shutdown: watch::Receiver<bool>,

    /// Resolves when the aggregator has answered and closed the connection
    closed: oneshot::Receiver<()>,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<R: AsyncRead + Unpin> ConnectionReader<R> {
    pub fn new(
        id: u64,
        stream: R,
        addr: SocketAddr,
        events: mpsc::Sender<ConnectionEvent>,
        shutdown: watch::Receiver<bool>,
        closed: oneshot::Receiver<()>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        Self {
            id,
            stream,
            addr,
            events,
            shutdown,
            closed,
            stats,
        }
    }

    /// Runs the read loop until EOF, error, close or shutdown.
    ///
    /// Always emits a final `Closed` event (best-effort) so the aggregator
    /// can reclaim any partial state for this connection.
    pub async fn run(mut self) {
        self.stats.connection_opened();
        debug!(id = self.id, client = %self.addr, "client connected");

        let mut buf = [0u8; READ_BUFFER_SIZE];
        loop {
            if *self.shutdown.borrow() {
                debug!(id = self.id, "shutdown requested, reader stopping");
                break;
            }

            tokio::select! {
                _ = &mut self.closed => {
                    trace!(id = self.id, "connection closed by handler");
                    break;
                }
                result = time::timeout(IDLE_READ_TIMEOUT, self.stream.read(&mut buf)) => match result {
                    // Deadline expired: not an error, loop back and recheck
                    // the shutdown flag.
                    Err(_) => {}
                    Ok(Ok(0)) => {
                        trace!(id = self.id, "end of stream");
                        break;
                    }
                    Ok(Ok(n)) => {
                        self.stats.bytes_read(n);
                        let payload = Bytes::copy_from_slice(&buf[..n]);
                        trace!(id = self.id, bytes = n, "chunk forwarded");
                        if self
                            .events
                            .send(ConnectionEvent::Data { id: self.id, payload })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(Err(e)) => {
                        warn!(id = self.id, client = %self.addr, error = %e, "read failed");
                        break;
                    }
                }
            }
        }

        let _ = self
            .events
            .send(ConnectionEvent::Closed { id: self.id })
            .await;
        self.stats.connection_closed();
        debug!(id = self.id, client = %self.addr, "client disconnected");
    }
}
