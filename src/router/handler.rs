//! Route Handlers
//!
//! This module implements the static route table and its handlers. Routing
//! is a pure priority-ordered mapping from a parsed request to a response;
//! the only side effects live in the file handlers, which touch the
//! configured working directory.
//!
//! ## Routes
//!
//! Evaluated in order, first match wins:
//!
//! | Pattern            | Method | Response                                  |
//! |--------------------|--------|-------------------------------------------|
//! | `/`                | any    | bare `200 OK`                             |
//! | `/user-agent`      | any    | `User-Agent` header echoed as text/plain  |
//! | `/echo/<value>`    | any    | `<value>` echoed as text/plain            |
//! | `/files/<name>`    | GET    | file contents as application/octet-stream |
//! | `/files/<name>`    | POST   | body written to file, `201 Created`       |
//! | anything else      |        | `404 Not Found`                           |
//!
//! Handler errors never unwind: a missing `User-Agent` is a `400`, a
//! missing file is a `404`, and any other file I/O failure is logged and
//! answered with a `500` on that connection alone.

use crate::protocol::types::{header, Request, Response};
use std::io;
use std::path::PathBuf;
use tokio::fs;
use tracing::error;

/// The static route table, built once at startup.
///
/// Holds the working directory that `/files/<name>` reads from and writes
/// to; everything else is immutable behavior.
#[derive(Debug, Clone)]
pub struct Router {
    /// Directory backing the `/files` routes
    directory: PathBuf,
}

impl Router {
    /// Creates a router serving files from the given directory.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Maps a request to its response.
    pub async fn dispatch(&self, request: &Request) -> Response {
        match request.path.as_str() {
            "/" => Response::ok(),
            "/user-agent" => user_agent(request),
            path => {
                if let Some(value) = path.strip_prefix("/echo/").filter(|v| !v.is_empty()) {
                    return echo(value);
                }
                if let Some(name) = path.strip_prefix("/files/").filter(|n| !n.is_empty()) {
                    return self.files(request, name).await;
                }
                Response::not_found()
            }
        }
    }

    /// `/files/<name>`: GET reads, POST writes, anything else is a 404.
    async fn files(&self, request: &Request, name: &str) -> Response {
        if request.method.eq_ignore_ascii_case("GET") {
            return self.read_file(name).await;
        }
        if request.method.eq_ignore_ascii_case("POST") {
            return self.write_file(name, &request.body).await;
        }
        Response::not_found()
    }

    async fn read_file(&self, name: &str) -> Response {
        let path = self.directory.join(name);
        match fs::read(&path).await {
            Ok(contents) => Response::octet_stream(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Response::not_found(),
            Err(e) => {
                error!(path = %path.display(), error = %e, "file read failed");
                Response::internal_error()
            }
        }
    }

    async fn write_file(&self, name: &str, body: &[u8]) -> Response {
        let path = self.directory.join(name);
        match fs::write(&path, body).await {
            Ok(()) => Response::created(),
            Err(e) => {
                error!(path = %path.display(), error = %e, "file write failed");
                Response::internal_error()
            }
        }
    }
}

/// `/user-agent`: echoes the `User-Agent` header value.
///
/// A request without the header is a client error, answered on this
/// connection only.
fn user_agent(request: &Request) -> Response {
    match request.header(header::USER_AGENT) {
        Some(value) => Response::text(value.to_string()),
        None => Response::bad_request(),
    }
}

/// `/echo/<value>`: echoes the captured path segment verbatim.
fn echo(value: &str) -> Response {
    Response::text(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::Status;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    /// Creates a unique, empty directory under the system temp dir.
    fn test_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "featherhttp-router-{}-{}",
            std::process::id(),
            TEST_DIR_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_request(method: &str, path: &str, headers: &[(&str, &str)], body: &[u8]) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            version: "1.1".to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            body: Bytes::copy_from_slice(body),
        }
    }

    #[tokio::test]
    async fn test_root() {
        let router = Router::new(".");
        let response = router.dispatch(&make_request("GET", "/", &[], b"")).await;
        assert_eq!(response.status(), Status::Ok);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_echo() {
        let router = Router::new(".");
        let response = router
            .dispatch(&make_request("GET", "/echo/abc", &[], b""))
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(&response.body()[..], b"abc");
    }

    #[tokio::test]
    async fn test_echo_without_value_is_not_found() {
        let router = Router::new(".");
        let response = router
            .dispatch(&make_request("GET", "/echo/", &[], b""))
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn test_user_agent() {
        let router = Router::new(".");
        let response = router
            .dispatch(&make_request(
                "GET",
                "/user-agent",
                &[("User-Agent", "curl/7.1")],
                b"",
            ))
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(&response.body()[..], b"curl/7.1");
    }

    #[tokio::test]
    async fn test_user_agent_missing_is_client_error() {
        let router = Router::new(".");
        let response = router
            .dispatch(&make_request("GET", "/user-agent", &[], b""))
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let router = Router::new(".");
        let response = router
            .dispatch(&make_request("GET", "/unknown/path", &[], b""))
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn test_files_post_then_get() {
        let dir = test_dir();
        let router = Router::new(&dir);

        let response = router
            .dispatch(&make_request("POST", "/files/test.txt", &[], b"hello"))
            .await;
        assert_eq!(response.status(), Status::Created);

        let response = router
            .dispatch(&make_request("GET", "/files/test.txt", &[], b""))
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(&response.body()[..], b"hello");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_files_post_truncates_existing() {
        let dir = test_dir();
        let router = Router::new(&dir);

        router
            .dispatch(&make_request("POST", "/files/out.bin", &[], b"a longer body"))
            .await;
        router
            .dispatch(&make_request("POST", "/files/out.bin", &[], b"short"))
            .await;

        let response = router
            .dispatch(&make_request("GET", "/files/out.bin", &[], b""))
            .await;
        assert_eq!(&response.body()[..], b"short");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_files_missing_is_not_found() {
        let dir = test_dir();
        let router = Router::new(&dir);

        let response = router
            .dispatch(&make_request("GET", "/files/missing.bin", &[], b""))
            .await;
        assert_eq!(response.status(), Status::NotFound);
        assert!(response.body().is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_files_other_method_is_not_found() {
        let dir = test_dir();
        let router = Router::new(&dir);

        let response = router
            .dispatch(&make_request("DELETE", "/files/test.txt", &[], b""))
            .await;
        assert_eq!(response.status(), Status::NotFound);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_files_method_match_ignores_case() {
        let dir = test_dir();
        let router = Router::new(&dir);

        let response = router
            .dispatch(&make_request("post", "/files/lower.txt", &[], b"ok"))
            .await;
        assert_eq!(response.status(), Status::Created);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
