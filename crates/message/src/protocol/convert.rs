//! Conversions into the `http` crate types, with the body as a [`Stream`]
//! (which implements [`http_body::Body`]).

use http::{HeaderName, HeaderValue, Method, StatusCode, Version};

use super::message::HttpMessage;
use super::request::{HttpRequest, Request};
use super::response::Response;
use super::server_request::ServerRequest;
use super::MessageError;
use crate::stream::Stream;

/// Maps a protocol version string to [`http::Version`].
pub fn http_version(version: &str) -> Result<Version, MessageError> {
    match version {
        "0.9" => Ok(Version::HTTP_09),
        "1.0" => Ok(Version::HTTP_10),
        "1.1" => Ok(Version::HTTP_11),
        "2" | "2.0" => Ok(Version::HTTP_2),
        "3" | "3.0" => Ok(Version::HTTP_3),
        other => Err(MessageError::invalid_argument(format!("unsupported protocol version {other:?}"))),
    }
}

fn copy_headers<M: HttpMessage>(message: &M, target: &mut http::HeaderMap) -> Result<(), MessageError> {
    for (name, values) in message.headers() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(MessageError::invalid_header)?;
        for value in values {
            let value = HeaderValue::from_str(value).map_err(MessageError::invalid_header)?;
            target.append(name.clone(), value);
        }
    }
    Ok(())
}

fn request_to_http<R: HttpRequest>(request: &R) -> Result<http::Request<Stream>, MessageError> {
    let method = Method::from_bytes(request.method().as_bytes()).map_err(MessageError::invalid_argument)?;
    let uri = if request.uri().authority().is_empty() { request.request_target() } else { request.uri().make() };
    let uri = uri.parse::<http::Uri>().map_err(MessageError::invalid_argument)?;

    let mut converted = http::Request::new(request.body().clone());
    *converted.method_mut() = method;
    *converted.uri_mut() = uri;
    *converted.version_mut() = http_version(request.protocol_version())?;
    copy_headers(request, converted.headers_mut())?;
    Ok(converted)
}

impl Request {
    /// Converts to an [`http::Request`] sharing this request's body.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] for anything the `http` crate
    /// refuses, e.g. a protocol version it doesn't know.
    pub fn to_http(&self) -> Result<http::Request<Stream>, MessageError> {
        request_to_http(self)
    }
}

impl ServerRequest {
    /// Converts to an [`http::Request`]; the server side bags are left behind.
    pub fn to_http(&self) -> Result<http::Request<Stream>, MessageError> {
        request_to_http(self)
    }
}

impl Response {
    /// Converts to an [`http::Response`] sharing this response's body.
    ///
    /// A custom reason phrase isn't carried over.
    pub fn to_http(&self) -> Result<http::Response<Stream>, MessageError> {
        let mut converted = http::Response::new(self.body().clone());
        *converted.status_mut() = StatusCode::from_u16(self.status_code()).map_err(MessageError::invalid_argument)?;
        *converted.version_mut() = http_version(self.protocol_version())?;
        copy_headers(self, converted.headers_mut())?;
        Ok(converted)
    }
}
