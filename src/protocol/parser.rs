//! HTTP Request Parser
//!
//! A pure, line-oriented parser that turns a complete [`FramedMessage`] into
//! a structured [`Request`], or a [`FramingError`] when the message violates
//! the grammar.
//!
//! ## Grammar
//!
//! Request line: `METHOD SP PATH SP "HTTP/" VERSION`
//! Header line: `KEY ": " VALUE` (key must be a non-empty token without
//! whitespace; the value is the rest of the line)
//!
//! Blank lines inside the header block are skipped. The body is attached
//! unchanged; its length was already validated during framing.
//!
//! ## Parse Once
//!
//! The aggregator calls [`content_length`] exactly once per message, when
//! the header terminator is found, and [`parse_request`] exactly once, when
//! the body is complete. Neither function is ever re-run on the same bytes.
//!
//! Parse failures never unwind past the connection they originate from: the
//! aggregator translates a [`FramingError`] into a `400 Bad Request` on the
//! offending connection and keeps serving the others.

use crate::protocol::types::{header, FramedMessage, Request};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while framing or parsing a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// The request line does not match `METHOD SP PATH SP "HTTP/" VERSION`
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// A non-blank header line does not match `KEY ": " VALUE`
    #[error("malformed header line: {0:?}")]
    MalformedHeaderLine(String),

    /// A `Content-Length` value that is not a non-negative integer
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// The header block is not valid UTF-8
    #[error("invalid UTF-8 in header block: {0}")]
    InvalidUtf8(String),
}

/// Result type for framing and parsing operations.
pub type FramingResult<T> = Result<T, FramingError>;

/// Parses a complete framed message into a structured request.
///
/// # Example
/// ```
/// use bytes::Bytes;
/// use featherhttp::protocol::{parse_request, types::FramedMessage};
///
/// let message = FramedMessage {
///     header: Bytes::from_static(b"GET /echo/abc HTTP/1.1\r\nHost: localhost\r\n\r\n"),
///     body: Bytes::new(),
/// };
/// let request = parse_request(message).unwrap();
/// assert_eq!(request.method, "GET");
/// assert_eq!(request.path, "/echo/abc");
/// ```
pub fn parse_request(message: FramedMessage) -> FramingResult<Request> {
    let text = std::str::from_utf8(&message.header)
        .map_err(|e| FramingError::InvalidUtf8(e.to_string()))?;

    let mut lines = text.split("\r\n");
    // split always yields at least one element
    let request_line = lines.next().unwrap_or_default();
    let (method, path, version) = parse_request_line(request_line)?;
    let headers = parse_headers(lines)?;

    Ok(Request {
        method,
        path,
        version,
        headers,
        body: message.body,
    })
}

/// Parses the request line into its method, path and version tokens.
fn parse_request_line(line: &str) -> FramingResult<(String, String, String)> {
    let malformed = || FramingError::MalformedRequestLine(line.to_string());

    let mut parts = line.split(' ');
    let (Some(method), Some(path), Some(protocol), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    if method.is_empty() || path.is_empty() {
        return Err(malformed());
    }

    let version = protocol.strip_prefix("HTTP/").ok_or_else(malformed)?;
    if version.is_empty() {
        return Err(malformed());
    }

    Ok((method.to_string(), path.to_string(), version.to_string()))
}

/// Parses the header lines following the request line.
///
/// Duplicate keys are last-write-wins; see [`Request::headers`].
fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> FramingResult<HashMap<String, String>> {
    let mut headers = HashMap::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(": ") else {
            return Err(FramingError::MalformedHeaderLine(line.to_string()));
        };
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(FramingError::MalformedHeaderLine(line.to_string()));
        }

        headers.insert(key.to_string(), value.trim().to_string());
    }

    Ok(headers)
}

/// Scans a header block for the declared body length.
///
/// Returns 0 when no `Content-Length` header is present. The lookup is
/// exact-case, like all header matching in this server. A value that does
/// not parse as a non-negative integer is a framing error.
///
/// The scan works on raw bytes so the aggregator can frame a message whose
/// header block would later fail UTF-8 validation in [`parse_request`].
pub fn content_length(header_block: &[u8]) -> FramingResult<usize> {
    let prefix = format!("{}: ", header::CONTENT_LENGTH);

    let mut declared: Option<&[u8]> = None;
    for line in header_block.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if let Some(rest) = line.strip_prefix(prefix.as_bytes()) {
            // last occurrence wins, matching the parsed header mapping
            declared = Some(rest);
        }
    }

    match declared {
        None => Ok(0),
        Some(raw) => {
            let value = std::str::from_utf8(raw)
                .map_err(|_| FramingError::InvalidContentLength(String::from_utf8_lossy(raw).into_owned()))?
                .trim();
            value
                .parse::<usize>()
                .map_err(|_| FramingError::InvalidContentLength(value.to_string()))
        }
    }
}
