//! Connection Acceptor & Lifecycle Supervisor
//!
//! This module owns the listening socket and the lifetime of every task the
//! server spawns: one reader per connection plus the single aggregator.
//!
//! ## Shutdown Protocol
//!
//! ```text
//! signal ──> watch flag flips
//!              │
//!              ├─ accept loop exits, listener dropped
//!              ├─ readers observe the flag on their next idle wake
//!              ├─ acceptor joins every reader
//!              ├─ event queue closes (all senders gone)
//!              └─ aggregator drains queued chunks and exits
//! ```
//!
//! `run` returns only after every reader has been joined and the aggregator
//! task has finished, so no task outlives the server.

use crate::aggregator::{Aggregator, ConnectionEvent};
use crate::connection::{ConnectionReader, ConnectionStats};
use crate::router::Router;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Capacity of the shared chunk queue; readers await when it is full.
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// The listening server.
///
/// # Example
///
/// ```ignore
/// use featherhttp::{router::Router, server::Server};
/// use tokio::net::TcpListener;
/// use tokio::sync::watch;
///
/// let listener = TcpListener::bind("127.0.0.1:4221").await?;
/// let (shutdown_tx, shutdown_rx) = watch::channel(false);
/// let server = Server::new(listener, Router::new("."));
/// server.run(shutdown_rx).await?;
/// ```
pub struct Server {
    listener: TcpListener,
    router: Router,
    stats: Arc<ConnectionStats>,
}

impl Server {
    /// Creates a server on an already-bound listener.
    pub fn new(listener: TcpListener, router: Router) -> Self {
        Self {
            listener,
            router,
            stats: Arc::new(ConnectionStats::new()),
        }
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle to the server's connection statistics.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections until the shutdown flag flips, then joins every
    /// spawned task before returning.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let (events, queue) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let aggregator =
            tokio::spawn(Aggregator::new(queue, self.router, Arc::clone(&self.stats)).run());

        let mut readers = JoinSet::new();
        let mut next_id: u64 = 0;
        // Template receiver handed to each reader; `shutdown` itself is
        // reserved for the accept loop's own select.
        let reader_shutdown = shutdown.clone();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let id = next_id;
                        next_id += 1;

                        let (read_half, write_half) = stream.into_split();
                        let (closer, closed) = oneshot::channel();

                        // Register the write half before the reader can emit
                        // a single chunk for this id.
                        if events
                            .send(ConnectionEvent::Opened { id, writer: write_half, closer })
                            .await
                            .is_err()
                        {
                            break;
                        }

                        let reader = ConnectionReader::new(
                            id,
                            read_half,
                            addr,
                            events.clone(),
                            reader_shutdown.clone(),
                            closed,
                            Arc::clone(&self.stats),
                        );
                        readers.spawn(reader.run());
                    }
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                    }
                },
                _ = shutdown.changed() => {
                    info!("shutdown requested, closing listener");
                    break;
                }
            }

            // Reap readers that already finished so the set stays small.
            while readers.try_join_next().is_some() {}
        }

        drop(self.listener);
        drop(events);

        debug!(outstanding = readers.len(), "waiting for readers to finish");
        while readers.join_next().await.is_some() {}
        aggregator.await?;

        info!("server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    static TEST_DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    fn test_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "featherhttp-server-{}-{}",
            std::process::id(),
            TEST_DIR_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    struct TestServer {
        addr: SocketAddr,
        shutdown: watch::Sender<bool>,
        handle: tokio::task::JoinHandle<anyhow::Result<()>>,
        stats: Arc<ConnectionStats>,
    }

    async fn create_test_server(directory: PathBuf) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Server::new(listener, Router::new(directory));
        let addr = server.local_addr().unwrap();
        let stats = server.stats();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(server.run(shutdown_rx));

        TestServer {
            addr,
            shutdown: shutdown_tx,
            handle,
            stats,
        }
    }

    /// Sends raw request bytes and reads the full response until the server
    /// closes the connection.
    async fn roundtrip(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(request).await.unwrap();

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_root_ok() {
        let server = create_test_server(test_dir()).await;

        let response = roundtrip(server.addr, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert_eq!(&response[..], b"HTTP/1.1 200 OK\r\n\r\n");
    }

    #[tokio::test]
    async fn test_echo_roundtrip() {
        let server = create_test_server(test_dir()).await;

        let response = roundtrip(server.addr, b"GET /echo/grape HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert_eq!(
            &response[..],
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\ngrape"
        );
    }

    #[tokio::test]
    async fn test_echo_byte_by_byte_chunks() {
        let server = create_test_server(test_dir()).await;

        let mut client = TcpStream::connect(server.addr).await.unwrap();
        for byte in b"GET /echo/slow HTTP/1.1\r\nHost: x\r\n\r\n" {
            client.write_all(&[*byte]).await.unwrap();
        }

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert_eq!(
            &response[..],
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 4\r\n\r\nslow"
        );
    }

    #[tokio::test]
    async fn test_user_agent_roundtrip() {
        let server = create_test_server(test_dir()).await;

        let response = roundtrip(
            server.addr,
            b"GET /user-agent HTTP/1.1\r\nUser-Agent: curl/7.1\r\n\r\n",
        )
        .await;
        let text = String::from_utf8(response).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\ncurl/7.1"));
    }

    #[tokio::test]
    async fn test_user_agent_missing_is_client_error() {
        let server = create_test_server(test_dir()).await;

        let response = roundtrip(server.addr, b"GET /user-agent HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert_eq!(&response[..], b"HTTP/1.1 400 Bad Request\r\n\r\n");

        // The server survived the client error.
        let response = roundtrip(server.addr, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert_eq!(&response[..], b"HTTP/1.1 200 OK\r\n\r\n");
    }

    #[tokio::test]
    async fn test_files_post_then_get() {
        let dir = test_dir();
        let server = create_test_server(dir.clone()).await;

        let response = roundtrip(
            server.addr,
            b"POST /files/test.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello",
        )
        .await;
        assert_eq!(&response[..], b"HTTP/1.1 201 Created\r\n\r\n");

        let response = roundtrip(server.addr, b"GET /files/test.txt HTTP/1.1\r\n\r\n").await;
        assert_eq!(
            &response[..],
            b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: 5\r\n\r\nhello"
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_files_missing_is_bare_not_found() {
        let server = create_test_server(test_dir()).await;

        let response = roundtrip(server.addr, b"GET /files/missing.bin HTTP/1.1\r\n\r\n").await;
        assert_eq!(&response[..], b"HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[tokio::test]
    async fn test_unknown_path_not_found() {
        let server = create_test_server(test_dir()).await;

        let response = roundtrip(server.addr, b"GET /unknown/path HTTP/1.1\r\n\r\n").await;
        assert_eq!(&response[..], b"HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[tokio::test]
    async fn test_malformed_request_isolated_to_connection() {
        let server = create_test_server(test_dir()).await;

        let response = roundtrip(server.addr, b"NONSENSE\r\nalso: nonsense\r\n\r\n").await;
        assert_eq!(&response[..], b"HTTP/1.1 400 Bad Request\r\n\r\n");

        // Other connections keep being served.
        let response = roundtrip(server.addr, b"GET /echo/alive HTTP/1.1\r\n\r\n").await;
        let text = String::from_utf8(response).unwrap();
        assert!(text.ends_with("alive"));
    }

    #[tokio::test]
    async fn test_unparsable_content_length_is_client_error() {
        let server = create_test_server(test_dir()).await;

        let response = roundtrip(
            server.addr,
            b"POST /files/x HTTP/1.1\r\nContent-Length: ten\r\n\r\n",
        )
        .await;
        assert_eq!(&response[..], b"HTTP/1.1 400 Bad Request\r\n\r\n");
    }

    #[tokio::test]
    async fn test_concurrent_connections_interleaved() {
        let server = create_test_server(test_dir()).await;

        // Open a connection that dribbles its request out slowly while a
        // second connection completes; per-connection state must not mix.
        let mut slow = TcpStream::connect(server.addr).await.unwrap();
        slow.write_all(b"GET /echo/sl").await.unwrap();

        let response = roundtrip(server.addr, b"GET /echo/fast HTTP/1.1\r\n\r\n").await;
        let text = String::from_utf8(response).unwrap();
        assert!(text.ends_with("fast"));

        slow.write_all(b"ow HTTP/1.1\r\n\r\n").await.unwrap();
        let mut response = Vec::new();
        slow.read_to_end(&mut response).await.unwrap();
        let text = String::from_utf8(response).unwrap();
        assert!(text.ends_with("slow"));
    }

    #[tokio::test]
    async fn test_stats_track_requests() {
        let server = create_test_server(test_dir()).await;

        roundtrip(server.addr, b"GET / HTTP/1.1\r\n\r\n").await;
        roundtrip(server.addr, b"GET /echo/x HTTP/1.1\r\n\r\n").await;

        assert_eq!(server.stats.connections_accepted.load(Ordering::Relaxed), 2);
        assert_eq!(server.stats.requests_served.load(Ordering::Relaxed), 2);
        assert!(server.stats.bytes_read.load(Ordering::Relaxed) > 0);
        assert!(server.stats.bytes_written.load(Ordering::Relaxed) > 0);
    }

    #[tokio::test]
    async fn test_graceful_shutdown_joins_everything() {
        let server = create_test_server(test_dir()).await;

        // One idle connection is open when shutdown fires.
        let _idle = TcpStream::connect(server.addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        server.shutdown.send(true).unwrap();

        // The idle reader notices within its idle deadline; well inside the
        // test timeout the whole server must have stopped.
        let result = tokio::time::timeout(Duration::from_secs(15), server.handle)
            .await
            .expect("server did not stop after shutdown")
            .unwrap();
        assert!(result.is_ok());
    }
}
