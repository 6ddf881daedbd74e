//! HTTP/1.1 Message Types
//!
//! This module defines the request and response types exchanged over the wire.
//! FeatherHTTP speaks plain HTTP/1.1 request text: a request line, `Key: value`
//! headers terminated by `\r\n`, a blank line, then exactly `Content-Length`
//! bytes of body (0 if the header is absent).
//!
//! ## Wire Format
//!
//! Request: `GET /echo/abc HTTP/1.1\r\nHost: localhost\r\n\r\n`
//! Response: `HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\nabc`
//!
//! Responses without a body are a bare status line followed by the blank
//! line, e.g. `HTTP/1.1 404 Not Found\r\n\r\n`.

use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::fmt;

/// The CRLF line terminator used by HTTP/1.1
pub const CRLF: &[u8] = b"\r\n";

/// The blank line separating the header block from the body
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Header names the server cares about
pub mod header {
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const USER_AGENT: &str = "User-Agent";
}

/// Content types produced by the built-in handlers
pub mod content_type {
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// A complete, length-validated message as produced by the aggregator.
///
/// `header` holds everything up to and including the `\r\n\r\n` terminator;
/// `body` holds exactly the declared `Content-Length` bytes. Any trailing
/// bytes beyond the declared length were discarded during framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedMessage {
    pub header: Bytes,
    pub body: Bytes,
}

/// A structured HTTP request, produced by [`parse_request`].
///
/// [`parse_request`]: crate::protocol::parse_request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request method, verbatim from the request line (e.g. `GET`)
    pub method: String,

    /// Request path, verbatim from the request line (e.g. `/echo/abc`)
    pub path: String,

    /// HTTP version, without the `HTTP/` prefix (e.g. `1.1`)
    pub version: String,

    /// Header mapping with case-sensitive keys.
    ///
    /// Duplicate keys are last-write-wins; multimap semantics are not
    /// guaranteed. This is a documented limitation.
    pub headers: HashMap<String, String>,

    /// Body bytes, already validated against `Content-Length` by framing
    pub body: Bytes,
}

impl Request {
    /// Looks up a header value by its exact, case-sensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// HTTP status codes produced by the built-in handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    BadRequest,
    NotFound,
    InternalServerError,
}

impl Status {
    /// The numeric status code.
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::InternalServerError => 500,
        }
    }

    /// The reason phrase sent on the status line.
    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// An HTTP response, serialized and written in one shot before the
/// connection is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    content_type: Option<&'static str>,
    body: Bytes,
}

impl Response {
    /// Creates a bare `200 OK` response with no headers and no body.
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// Creates a bare `201 Created` response.
    pub fn created() -> Self {
        Self {
            status: Status::Created,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// Creates a bare `400 Bad Request` response.
    pub fn bad_request() -> Self {
        Self {
            status: Status::BadRequest,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// Creates a bare `404 Not Found` response.
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// Creates a bare `500 Internal Server Error` response.
    pub fn internal_error() -> Self {
        Self {
            status: Status::InternalServerError,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// Creates a `200 OK` response with a `text/plain` body.
    ///
    /// # Example
    /// ```
    /// use featherhttp::protocol::types::Response;
    /// let echo = Response::text("abc");
    /// ```
    pub fn text(body: impl Into<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            content_type: Some(content_type::TEXT_PLAIN),
            body: body.into(),
        }
    }

    /// Creates a `200 OK` response with an `application/octet-stream` body.
    pub fn octet_stream(body: impl Into<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            content_type: Some(content_type::OCTET_STREAM),
            body: body.into(),
        }
    }

    /// The response status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Serializes the response into wire bytes.
    ///
    /// The status line comes first. `Content-Type` is emitted only when one
    /// was set; `Content-Length` whenever a content type is set or the body
    /// is non-empty. A blank line separates headers from the body.
    pub fn serialize(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(64 + self.body.len());

        out.extend_from_slice(
            format!("HTTP/1.1 {} {}\r\n", self.status.code(), self.status.reason()).as_bytes(),
        );

        if let Some(content_type) = self.content_type {
            out.extend_from_slice(format!("{}: {}\r\n", header::CONTENT_TYPE, content_type).as_bytes());
        }
        if self.content_type.is_some() || !self.body.is_empty() {
            out.extend_from_slice(
                format!("{}: {}\r\n", header::CONTENT_LENGTH, self.body.len()).as_bytes(),
            );
        }

        out.extend_from_slice(CRLF);
        out.extend_from_slice(&self.body);
        out.freeze()
    }
}
