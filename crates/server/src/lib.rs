//! Gateway glue for micro-message
//!
//! This crate turns a CGI-style request environment into a
//! [`ServerRequest`](micro_message::protocol::ServerRequest) and writes a
//! [`Response`](micro_message::protocol::Response) back out in HTTP wire format.
//!
//! # Features
//!
//! - Explicit [`RequestEnvironment`](environment::RequestEnvironment) instead of process-wide state
//! - `HTTP_*` variables to headers, cookies, query and URI reconstruction
//! - Form and JSON body parsing for `POST` requests
//! - Single-file and multi-file upload shapes normalized into one tree
//! - Blocking and tokio transmitters sharing one wire codec
//!
//! # Example
//!
//! ```
//! use micro_message::protocol::{HttpMessage, Response};
//! use micro_message::stream::Stream;
//! use micro_message_server::environment::RequestEnvironment;
//! use micro_message_server::factory::{DefaultServerRequestFactory, ServerRequestFactory};
//! use micro_message_server::transmitter::ResponseTransmitter;
//!
//! let env = RequestEnvironment::from_vars([
//!     ("REQUEST_METHOD", "GET"),
//!     ("HTTP_HOST", "example.org"),
//!     ("REQUEST_URI", "/hello?name=world"),
//!     ("QUERY_STRING", "name=world"),
//! ]);
//!
//! let request = DefaultServerRequestFactory::default().build_server_request(&env).unwrap();
//! let name = &request.query_params()["name"];
//!
//! let response = Response::new()
//!     .with_header("Content-Type", "text/plain")
//!     .unwrap()
//!     .with_body(Stream::from_bytes(format!("hello {name}")));
//!
//! let mut transmitter = ResponseTransmitter::new(Vec::new());
//! transmitter.send(&response).unwrap();
//! assert_eq!(
//!     transmitter.into_inner(),
//!     b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello world"
//! );
//! ```
//!
//! # Architecture
//!
//! - [`environment`]: the request environment
//! - [`factory`]: building server requests and normalizing uploads
//! - [`codec`]: response head and body encoding
//! - [`transmitter`]: sending responses over blocking or async writers

pub mod codec;
pub mod environment;
pub mod factory;
pub mod transmitter;
