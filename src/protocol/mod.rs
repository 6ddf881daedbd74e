//! HTTP/1.1 Protocol Implementation
//!
//! This module provides the wire-level types and the pure request parser.
//!
//! ## Overview
//!
//! FeatherHTTP deliberately parses HTTP by hand: the framing layer (see
//! [`crate::aggregator`]) finds message boundaries in the byte stream, and
//! this module turns the resulting complete messages into structured
//! requests and serializes responses back to wire bytes.
//!
//! ## Modules
//!
//! - `types`: [`Request`], [`Response`], [`Status`] and [`FramedMessage`]
//! - `parser`: the pure `FramedMessage -> Request` transform and the
//!   framing-time `Content-Length` scan
//!
//! ## Example
//!
//! ```ignore
//! use featherhttp::protocol::{parse_request, types::{FramedMessage, Response}};
//! use bytes::Bytes;
//!
//! let message = FramedMessage {
//!     header: Bytes::from_static(b"GET / HTTP/1.1\r\n\r\n"),
//!     body: Bytes::new(),
//! };
//! let request = parse_request(message)?;
//! let bytes = Response::ok().serialize();
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{content_length, parse_request, FramingError, FramingResult};
pub use types::{FramedMessage, Request, Response, Status};
