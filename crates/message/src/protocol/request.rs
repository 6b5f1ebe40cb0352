//! Outgoing client requests.
//!
//! A [`Request`] is a [`Message`] plus a method, a target [`Uri`] and an
//! optional request-target override. The `Host` header follows the URI unless
//! the caller asks to preserve it, see [`HttpRequest::with_uri`].

use http::Method;
use tracing::warn;

use super::header::{self, HeaderValues, Headers};
use super::message::{sealed::Sealed, HttpMessage, Message};
use super::MessageError;
use crate::ensure;
use crate::stream::Stream;
use crate::uri::{IntoUri, Uri};

/// Methods a request may carry, compared case-insensitively.
pub const SUPPORTED_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
    Method::TRACE,
    Method::CONNECT,
];

pub fn is_supported_method(method: &str) -> bool {
    SUPPORTED_METHODS.iter().any(|supported| supported.as_str().eq_ignore_ascii_case(method))
}

fn check_method(method: &str) -> Result<(), MessageError> {
    ensure!(
        is_supported_method(method),
        MessageError::invalid_argument(format!("the HTTP method {method:?} is not valid"))
    );
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Request {
    message: Message,
    method: String,
    uri: Uri,
    request_target: Option<String>,
}

impl Request {
    /// A request without headers (other than `Host`) and an empty body.
    ///
    /// # Errors
    ///
    /// Fails with [`MessageError::InvalidArgument`] for an unsupported method or
    /// an unparsable URI.
    pub fn new(method: &str, uri: impl IntoUri) -> Result<Self, MessageError> {
        Self::from_parts(method, uri, Vec::<(&str, HeaderValues)>::new(), Stream::temp())
    }

    /// Builds a request from all of its parts.
    ///
    /// Header entries that aren't valid are skipped with a warning rather than
    /// failing the whole request. When no `Host` header is given, it's taken
    /// from the URI.
    pub fn from_parts<I, N, V>(method: &str, uri: impl IntoUri, headers: I, body: Stream) -> Result<Self, MessageError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<HeaderValues>,
    {
        check_method(method)?;
        let uri = uri.into_uri()?;

        let mut accepted = Headers::new();
        for (name, value) in headers {
            let name = name.as_ref();
            let values = value.into().into_vec();
            match header::validate(name, &values) {
                Ok(()) => accepted.set(name, values),
                Err(e) => warn!(name = %name, cause = %e, "dropping invalid request header"),
            }
        }

        if !accepted.contains("host") && !uri.host().is_empty() {
            accepted.set("Host", vec![uri.host().to_string()]);
        }

        Ok(Self { message: Message::with_parts(accepted, body), method: method.to_string(), uri, request_target: None })
    }
}

pub(crate) mod sealed {
    use super::Request;

    pub trait SealedRequest {
        fn request(&self) -> &Request;

        fn request_mut(&mut self) -> &mut Request;
    }
}

/// Request line accessors and updates, on top of [`HttpMessage`].
pub trait HttpRequest: HttpMessage + sealed::SealedRequest {
    /// The method as given, case preserved.
    fn method(&self) -> &str {
        &self.request().method
    }

    /// # Errors
    ///
    /// Fails with [`MessageError::InvalidArgument`] naming the method when it's
    /// not one of [`SUPPORTED_METHODS`].
    fn with_method(&self, method: &str) -> Result<Self, MessageError> {
        check_method(method)?;
        let mut next = self.clone();
        method.clone_into(&mut next.request_mut().method);
        Ok(next)
    }

    fn uri(&self) -> &Uri {
        &self.request().uri
    }

    /// Replaces the URI and updates `Host` from it.
    ///
    /// With `preserve_host`, the `Host` header is only filled in when it's
    /// missing or empty and the new URI has a host; an existing value stays.
    /// Without it, a non-empty URI host always replaces the header.
    fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        let mut next = self.clone();

        let host = uri.host().to_string();
        let has_host_header = !self.header_line("host").is_empty();
        let update_host = !host.is_empty() && (!preserve_host || !has_host_header);

        next.request_mut().uri = uri;
        if update_host {
            next.message_mut().headers_mut().set("Host", vec![host]);
        }
        next
    }

    /// The explicit request-target if one was set, otherwise the URI's
    /// `path[?query]`, or `/` when both are empty.
    fn request_target(&self) -> String {
        let request = self.request();
        if let Some(target) = &request.request_target {
            return target.clone();
        }

        let mut target = request.uri.path().to_string();
        if !request.uri.query().is_empty() {
            target.push('?');
            target.push_str(request.uri.query());
        }
        if target.is_empty() {
            target.push('/');
        }
        target
    }

    /// Overrides the request-target, e.g. with `*` or an absolute-form URI.
    ///
    /// # Errors
    ///
    /// Fails with [`MessageError::InvalidArgument`] if the target is empty or
    /// holds whitespace.
    fn with_request_target(&self, target: &str) -> Result<Self, MessageError> {
        ensure!(
            !target.is_empty() && !target.contains(char::is_whitespace),
            MessageError::invalid_argument(format!("invalid request target {target:?}"))
        );
        let mut next = self.clone();
        next.request_mut().request_target = Some(target.to_string());
        Ok(next)
    }
}

impl Sealed for Request {
    fn message(&self) -> &Message {
        &self.message
    }

    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}

impl sealed::SealedRequest for Request {
    fn request(&self) -> &Request {
        self
    }

    fn request_mut(&mut self) -> &mut Request {
        self
    }
}

impl HttpMessage for Request {}

impl HttpRequest for Request {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_target() {
        let request = Request::new("GET", "http://www.example.com").unwrap();
        assert_eq!(request.request_target(), "/");

        let request = Request::new("GET", "http://www.example.com/a/b?c=d").unwrap();
        assert_eq!(request.request_target(), "/a/b?c=d");
    }

    #[test]
    fn explicit_request_target() {
        let request = Request::new("OPTIONS", "http://www.example.com/x").unwrap();
        assert_eq!(request.with_request_target("/").unwrap().request_target(), "/");
        assert_eq!(request.with_request_target("*").unwrap().request_target(), "*");
        assert_eq!(
            request.with_request_target("http://example.com/y?z").unwrap().request_target(),
            "http://example.com/y?z"
        );
        assert_eq!(request.request_target(), "/x");

        assert!(request.with_request_target("/a b").unwrap_err().is_invalid_argument());
        assert!(request.with_request_target("").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn methods() {
        let request = Request::new("get", "/").unwrap();
        assert_eq!(request.method(), "get");

        for method in ["GET", "post", "Put", "PATCH", "delete", "OPTIONS", "head", "TRACE", "connect"] {
            assert_eq!(request.with_method(method).unwrap().method(), method);
        }

        let e = request.with_method("BREW").unwrap_err();
        assert!(e.is_invalid_argument());
        assert!(e.to_string().contains("BREW"));
        assert!(Request::new("FOO", "/").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn invalid_uri_fails() {
        assert!(Request::new("GET", "ftp://example.org").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn constructor_drops_invalid_headers() {
        let request = Request::from_parts(
            "POST",
            "http://example.org/",
            [("Content-Type", HeaderValues::from("text/plain")), ("bad name", "x".into()), ("X-Ok", ["a", "b"].into())],
            Stream::from_bytes("body"),
        )
        .unwrap();

        assert_eq!(request.header("content-type"), ["text/plain"]);
        assert!(!request.has_header("bad name"));
        assert_eq!(request.header_line("x-ok"), "a,b");
        assert_eq!(request.body().to_string(), "body");
    }

    #[test]
    fn host_header_from_uri() {
        let request = Request::new("GET", "http://example.org/").unwrap();
        assert_eq!(request.header("Host"), ["example.org"]);

        let request = Request::from_parts("GET", "http://example.org/", [("host", "other.org")], Stream::temp()).unwrap();
        assert_eq!(request.header("Host"), ["other.org"]);

        let request = Request::new("GET", "/relative").unwrap();
        assert!(!request.has_header("host"));
    }

    #[test]
    fn with_uri_replaces_host() {
        let request = Request::new("GET", "http://example.org/").unwrap();
        let changed = request.with_uri(Uri::parse("http://example.com/x").unwrap(), false);

        assert_eq!(changed.uri().host(), "example.com");
        assert_eq!(changed.header_line("host"), "example.com");
        assert_eq!(request.header_line("host"), "example.org");
        assert_eq!(request.uri().path(), "/");
    }

    #[test]
    fn with_uri_preserving_host() {
        let request = Request::new("GET", "http://example.org/").unwrap();
        let changed = request.with_uri(Uri::parse("http://example.com/").unwrap(), true);
        assert_eq!(changed.header_line("host"), "example.org");

        let bare = Request::new("GET", "/").unwrap();
        let changed = bare.with_uri(Uri::parse("http://example.com/").unwrap(), true);
        assert_eq!(changed.header_line("host"), "example.com");

        let changed = bare.with_uri(Uri::parse("/other").unwrap(), true);
        assert!(!changed.has_header("host"));
    }

    #[test]
    fn with_uri_without_host_keeps_header() {
        let request = Request::new("GET", "http://example.org/").unwrap();
        let changed = request.with_uri(Uri::parse("/local").unwrap(), false);
        assert_eq!(changed.header_line("host"), "example.org");
        assert_eq!(changed.request_target(), "/local");
    }

    #[test]
    fn message_algebra_applies() {
        let request = Request::new("GET", "http://example.org/").unwrap();
        let changed = request.with_header("Accept", "*/*").unwrap().with_protocol_version("1.0");
        assert_eq!(changed.method(), "GET");
        assert_eq!(changed.protocol_version(), "1.0");
        assert!(changed.has_header("accept"));
        assert!(!request.has_header("accept"));
    }
}
