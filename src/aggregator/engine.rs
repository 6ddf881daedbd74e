//! The Aggregator Task
//!
//! Exactly one aggregator task runs per server. It is the single consumer of
//! the shared event queue and the single owner of all per-connection framing
//! state, so the buffer map needs no locks: exclusivity holds by
//! construction, not by synchronization.
//!
//! ## Event Flow
//!
//! ```text
//! Acceptor ──Opened{id, writer, closer}──┐
//! Reader 0 ──Data{id, payload}───────────┤
//! Reader 1 ──Data{id, payload}───────────┼──> Aggregator ──> Parser ──> Router
//! Reader N ──Closed{id}──────────────────┘         │
//!                                                  └──> response written,
//!                                                       connection closed
//! ```
//!
//! Chunks from one connection arrive in read order because a single reader
//! enqueues them sequentially; no ordering holds across connections, and
//! none is needed since all state is keyed by connection id.
//!
//! ## Lifecycle
//!
//! The task ends when the event queue closes, which happens only once the
//! acceptor and every reader have dropped their senders. Chunks already
//! queued at shutdown are still drained; partial messages waiting on more
//! bytes are abandoned and logged.

use crate::aggregator::assembler::Assembly;
use crate::connection::ConnectionStats;
use crate::protocol::parser::parse_request;
use crate::protocol::types::{FramedMessage, Response};
use crate::router::Router;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

/// Events flowing from the acceptor and the readers into the aggregator.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A connection was accepted. Registers its write half and the close
    /// signal before any of its data can arrive.
    Opened {
        id: u64,
        writer: OwnedWriteHalf,
        closer: oneshot::Sender<()>,
    },

    /// One read's worth of bytes from a connection.
    Data { id: u64, payload: Bytes },

    /// The connection's reader terminated; its state can be reclaimed.
    Closed { id: u64 },
}

/// Per-connection state owned exclusively by the aggregator.
struct Slot {
    writer: OwnedWriteHalf,
    /// Dropping this wakes the reader so it exits without waiting out its
    /// idle deadline.
    closer: oneshot::Sender<()>,
    assembly: Assembly,
}

/// The single-owner reassembly and dispatch task.
pub struct Aggregator {
    events: mpsc::Receiver<ConnectionEvent>,
    connections: HashMap<u64, Slot>,
    router: Router,
    stats: Arc<ConnectionStats>,
}

impl Aggregator {
    /// Creates an aggregator consuming the given event queue.
    pub fn new(
        events: mpsc::Receiver<ConnectionEvent>,
        router: Router,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        Self {
            events,
            connections: HashMap::new(),
            router,
            stats,
        }
    }

    /// Runs until the event queue closes.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            match event {
                ConnectionEvent::Opened { id, writer, closer } => {
                    trace!(id, "connection registered");
                    self.connections.insert(
                        id,
                        Slot {
                            writer,
                            closer,
                            assembly: Assembly::new(),
                        },
                    );
                }
                ConnectionEvent::Data { id, payload } => {
                    self.on_data(id, payload).await;
                }
                ConnectionEvent::Closed { id } => {
                    if let Some(slot) = self.connections.remove(&id) {
                        trace!(id, buffered = slot.assembly.buffered(), "connection state reclaimed");
                    }
                }
            }
        }

        if !self.connections.is_empty() {
            debug!(
                abandoned = self.connections.len(),
                "event queue closed with partial requests in flight"
            );
        }
    }

    /// Feeds a chunk to the connection's assembly and dispatches on
    /// completion.
    async fn on_data(&mut self, id: u64, payload: Bytes) {
        let result = match self.connections.get_mut(&id) {
            Some(slot) => slot.assembly.push(&payload),
            None => {
                // Already framed and answered: one request per connection,
                // anything further is pipelining residue.
                trace!(id, bytes = payload.len(), "discarding bytes for completed connection");
                return;
            }
        };

        match result {
            Ok(None) => {}
            Ok(Some(message)) => {
                if let Some(slot) = self.connections.remove(&id) {
                    self.dispatch(id, slot, message).await;
                }
            }
            Err(e) => {
                warn!(id, error = %e, "framing failed");
                if let Some(slot) = self.connections.remove(&id) {
                    respond(id, slot, Response::bad_request(), &self.stats).await;
                }
            }
        }
    }

    /// Parses the framed message and routes it to a handler.
    ///
    /// Parse failures degrade to a `400 Bad Request` on this connection
    /// only; the aggregator keeps running either way.
    async fn dispatch(&mut self, id: u64, slot: Slot, message: FramedMessage) {
        let response = match parse_request(message) {
            Ok(request) => {
                trace!(id, method = %request.method, path = %request.path, "request dispatched");
                self.router.dispatch(&request).await
            }
            Err(e) => {
                warn!(id, error = %e, "request rejected");
                Response::bad_request()
            }
        };

        self.stats.request_served();
        respond(id, slot, response, &self.stats).await;
    }
}

/// Writes the response in one shot, then closes the connection.
///
/// The slot is consumed: dropping its closer wakes the reader, and shutting
/// down the write half sends FIN to the client. Write errors are confined
/// to this connection.
async fn respond(id: u64, mut slot: Slot, response: Response, stats: &ConnectionStats) {
    let bytes = response.serialize();
    match slot.writer.write_all(&bytes).await {
        Ok(()) => {
            stats.bytes_written(bytes.len());
            if let Err(e) = slot.writer.shutdown().await {
                debug!(id, error = %e, "connection shutdown failed");
            }
            debug!(id, status = %response.status(), bytes = bytes.len(), "response sent");
        }
        Err(e) => {
            debug!(id, error = %e, "response write failed");
        }
    }

    // Waking the reader is the last step; it exits without waiting out its
    // idle deadline.
    drop(slot.closer);
}
