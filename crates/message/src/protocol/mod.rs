//! HTTP message types and their immutable update algebra.
//!
//! # Architecture
//!
//! - **Messages** (`message`): the base [`Message`] and the [`HttpMessage`]
//!   trait every message type implements
//!   - [`Headers`]: ordered, case-insensitive, case-preserving header storage
//!   - [`HeaderValues`]: one value or a list, as accepted by `with_header`
//!
//! - **Requests** (`request`, `server_request`):
//!   - [`Request`] and the [`HttpRequest`] trait: method, URI, request-target
//!   - [`ServerRequest`]: server parameters, cookies, query, uploads, parsed
//!     body and attributes
//!
//! - **Responses** (`response`): [`Response`] with status code and reason phrase
//!
//! - **Uploads** (`upload`): [`UploadedFile`], [`UploadErrorCode`] and the
//!   [`UploadedFiles`] tree
//!
//! - **Error Handling** (`error`): [`MessageError`]
//!
//! Every `with_*` method takes `&self` and returns a new value; the receiver is
//! never changed. Updates are all-or-nothing: on error nothing is returned but
//! the error.

mod error;
pub use error::MessageError;

mod header;
pub use header::HeaderValues;
pub use header::Headers;

mod message;
pub use message::HttpMessage;
pub use message::Message;
pub use message::DEFAULT_PROTOCOL_VERSION;

mod request;
pub use request::is_supported_method;
pub use request::HttpRequest;
pub use request::Request;
pub use request::SUPPORTED_METHODS;

mod server_request;
pub use server_request::split_query;
pub use server_request::Attribute;
pub use server_request::Attributes;
pub use server_request::Params;
pub use server_request::ServerRequest;
pub use server_request::ServerRequestBuilder;
pub use server_request::QUERY_STRING;

mod parsed_body;
pub use parsed_body::value_kind;
pub use parsed_body::ParsedBody;

mod upload;
pub use upload::UploadErrorCode;
pub use upload::UploadedFile;
pub use upload::UploadedFiles;

mod response;
pub use response::Response;

mod status;
pub use status::is_valid_status_code;
pub use status::reason_phrase;

mod convert;
pub use convert::http_version;
