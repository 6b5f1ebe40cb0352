//! Immutable HTTP message value types
//!
//! This crate provides the pieces an HTTP application passes around: requests,
//! server requests, responses, URIs, body streams and uploaded files. Messages
//! are values. Nothing is changed in place; every `with_*` call returns a new
//! message that shares whatever it didn't change with the old one.
//!
//! # Features
//!
//! - Case-insensitive, case-preserving, ordered headers
//! - RFC 3986 URI parsing with percent-encoding that never double-encodes
//! - Host header synchronization when a request's URI changes
//! - Status codes with default reason phrases
//! - Streams over memory, files, readers and writers, usable as an
//!   [`http_body::Body`]
//! - Move-once uploaded files
//! - Conversion into `http::Request` / `http::Response`
//!
//! # Example
//!
//! ```
//! use micro_message::protocol::{HttpMessage, HttpRequest, Request, Response};
//! use micro_message::stream::Stream;
//! use micro_message::uri::Uri;
//!
//! let request = Request::new("GET", "http://example.org/articles?page=2").unwrap();
//! assert_eq!(request.request_target(), "/articles?page=2");
//! assert_eq!(request.header_line("Host"), "example.org");
//!
//! let moved = request.with_uri(Uri::parse("https://example.com/").unwrap(), false);
//! assert_eq!(moved.header_line("host"), "example.com");
//! assert_eq!(request.header_line("host"), "example.org");
//!
//! let response = Response::new()
//!     .with_status(201)
//!     .unwrap()
//!     .with_header("Content-Type", "text/plain")
//!     .unwrap()
//!     .with_body(Stream::from_bytes("created"));
//! assert_eq!(response.reason_phrase(), "Created");
//! assert_eq!(response.body().to_string(), "created");
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: messages, requests, responses, uploads and errors
//! - [`uri`]: URI parsing, encoding and serialization
//! - [`stream`]: body streams and the resources behind them

pub mod protocol;
pub mod stream;
pub mod uri;

mod utils;
pub(crate) use utils::ensure;
