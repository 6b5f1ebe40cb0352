//! The shared message model and its immutable update algebra.
//!
//! [`Message`] holds what every HTTP message has: a protocol version, headers
//! and a body. [`HttpMessage`] gives every message type ([`Message`],
//! [`Request`](super::Request), [`ServerRequest`](super::ServerRequest),
//! [`Response`](super::Response)) the same accessors and `with_*` methods.
//!
//! A `with_*` call clones the receiver, changes one field on the clone and
//! returns it. Headers sit behind an [`Arc`] and are only copied when a clone
//! actually changes them; the body is a [`Stream`] handle and stays shared.

use std::borrow::Cow;

use triomphe::Arc;

use super::header::{self, HeaderValues, Headers};
use super::MessageError;
use crate::stream::Stream;

/// Protocol version of a freshly created message.
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.1";

/// Version, headers and body of an HTTP message.
#[derive(Debug, Clone)]
pub struct Message {
    version: String,
    headers: Arc<Headers>,
    body: Stream,
}

impl Message {
    /// An HTTP/1.1 message without headers and an empty temporary body.
    pub fn new() -> Self {
        Self::with_parts(Headers::new(), Stream::temp())
    }

    pub(crate) fn with_parts(headers: Headers, body: Stream) -> Self {
        Self { version: DEFAULT_PROTOCOL_VERSION.to_string(), headers: Arc::new(headers), body }
    }

    pub(crate) fn headers_mut(&mut self) -> &mut Headers {
        Arc::make_mut(&mut self.headers)
    }

    /// Returns true if both messages share one header set.
    pub(crate) fn shares_headers(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.headers, &other.headers)
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) mod sealed {
    use super::Message;

    pub trait Sealed {
        fn message(&self) -> &Message;

        fn message_mut(&mut self) -> &mut Message;
    }
}

/// Accessors and immutable updates shared by every message type.
///
/// No method mutates the receiver. The `with_*` methods return a new value,
/// or an error and nothing else.
///
/// # Example
///
/// ```
/// use micro_message::protocol::{HttpMessage, Response};
///
/// let response = Response::new().with_header("Content-Type", "text/plain").unwrap();
/// let added = response.with_added_header("content-type", ["charset=utf-8"]).unwrap();
///
/// assert_eq!(response.header("CONTENT-TYPE"), ["text/plain"]);
/// assert_eq!(added.header_line("Content-Type"), "text/plain,charset=utf-8");
/// ```
pub trait HttpMessage: sealed::Sealed + Clone {
    /// The version number only, e.g. `"1.1"`.
    fn protocol_version(&self) -> &str {
        &self.message().version
    }

    fn with_protocol_version(&self, version: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.message_mut().version = version.into();
        next
    }

    fn headers(&self) -> &Headers {
        &self.message().headers
    }

    fn has_header(&self, name: &str) -> bool {
        self.message().headers.contains(name)
    }

    /// All values of a header, empty if absent.
    fn header(&self, name: &str) -> &[String] {
        self.message().headers.get(name)
    }

    /// All values of a header joined with `,`, empty if absent.
    fn header_line(&self, name: &str) -> String {
        self.message().headers.get_line(name)
    }

    /// Replaces every value of `name`. The returned message reports the header
    /// under the casing given here.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] when the name isn't a valid
    /// token, no value is given, or a value isn't a valid field value.
    fn with_header(&self, name: &str, value: impl Into<HeaderValues>) -> Result<Self, MessageError> {
        let values = value.into().into_vec();
        header::validate(name, &values)?;

        let mut next = self.clone();
        next.message_mut().headers_mut().set(name, values);
        Ok(next)
    }

    /// Appends values to `name`, creating the header if absent.
    ///
    /// # Errors
    ///
    /// Fails like [`HttpMessage::with_header`].
    fn with_added_header(&self, name: &str, value: impl Into<HeaderValues>) -> Result<Self, MessageError> {
        let values = value.into().into_vec();
        header::validate(name, &values)?;

        let mut next = self.clone();
        next.message_mut().headers_mut().append(name, values);
        Ok(next)
    }

    /// Removes `name`; borrows the receiver unchanged when there's no such header.
    fn without_header(&self, name: &str) -> Cow<'_, Self> {
        if !self.has_header(name) {
            return Cow::Borrowed(self);
        }

        let mut next = self.clone();
        next.message_mut().headers_mut().remove(name);
        Cow::Owned(next)
    }

    fn body(&self) -> &Stream {
        &self.message().body
    }

    fn with_body(&self, body: Stream) -> Self {
        let mut next = self.clone();
        next.message_mut().body = body;
        next
    }
}

impl sealed::Sealed for Message {
    fn message(&self) -> &Message {
        self
    }

    fn message_mut(&mut self) -> &mut Message {
        self
    }
}

impl HttpMessage for Message {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let message = Message::new();
        assert_eq!(message.protocol_version(), "1.1");
        assert!(message.headers().is_empty());
        assert_eq!(message.body().size(), Some(0));
    }

    #[test]
    fn protocol_version_is_immutable() {
        let message = Message::new();
        let changed = message.with_protocol_version("1.0");
        assert_eq!(changed.protocol_version(), "1.0");
        assert_eq!(message.protocol_version(), "1.1");
    }

    #[test]
    fn with_header_leaves_receiver_untouched() {
        let message = Message::new();
        let changed = message.with_header("Foo", "bar").unwrap();

        assert!(changed.has_header("foo"));
        assert!(changed.has_header("FOO"));
        assert_eq!(changed.header("fOO"), ["bar"]);
        assert!(!message.has_header("foo"));
        assert!(message.headers().is_empty());
    }

    #[test]
    fn with_header_replaces() {
        let message = Message::new().with_header("foo", ["bar", "baz"]).unwrap();
        let replaced = message.with_header("FOO", "bim").unwrap();

        assert_eq!(replaced.header("foo"), ["bim"]);
        assert_eq!(replaced.headers().iter().next().unwrap().0, "FOO");
        assert_eq!(message.header("foo"), ["bar", "baz"]);
    }

    #[test]
    fn added_header_appends_in_order() {
        let message = Message::new().with_header("foo", ["bar", "baz", "bim"]).unwrap();
        let added = message.with_added_header("foo", ["bam", "blip"]).unwrap();

        assert_eq!(added.header("foo").len(), 5);
        assert_eq!(added.header("foo"), ["bar", "baz", "bim", "bam", "blip"]);
        assert_eq!(added.header_line("foo"), "bar,baz,bim,bam,blip");
        assert_eq!(message.header("foo").len(), 3);
    }

    #[test]
    fn empty_value_list_is_rejected() {
        let message = Message::new().with_header("X", "1").unwrap();

        assert!(message.with_header("X", Vec::<String>::new()).unwrap_err().is_invalid_argument());
        assert!(message.with_added_header("Y", Vec::<&str>::new()).unwrap_err().is_invalid_argument());
        assert_eq!(message.header("x"), ["1"]);
        assert!(!message.has_header("y"));
    }

    #[test]
    fn added_header_creates_when_absent() {
        let message = Message::new().with_added_header("X-Test", "one").unwrap();
        assert_eq!(message.header("x-test"), ["one"]);
    }

    #[test]
    fn invalid_headers_fail() {
        let message = Message::new();
        assert!(message.with_header("", "v").unwrap_err().is_invalid_argument());
        assert!(message.with_header("with space", "v").unwrap_err().is_invalid_argument());
        assert!(message.with_added_header("x", "a\nb").unwrap_err().is_invalid_argument());
        assert!(message.with_header("x", ["ok", "bad\r\n"]).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn missing_header_reads_empty() {
        let message = Message::new();
        assert!(message.header("nope").is_empty());
        assert_eq!(message.header_line("nope"), "");
    }

    #[test]
    fn without_header() {
        let message = Message::new().with_header("Foo", "bar").unwrap();

        let removed = message.without_header("FOO");
        assert!(matches!(removed, Cow::Owned(_)));
        assert!(!removed.has_header("foo"));
        assert!(message.has_header("foo"));

        let unchanged = message.without_header("missing");
        assert!(matches!(unchanged, Cow::Borrowed(m) if std::ptr::eq(m, &message)));
    }

    #[test]
    fn untouched_headers_are_shared() {
        let message = Message::new().with_header("Foo", "bar").unwrap();
        let versioned = message.with_protocol_version("2");
        assert!(message.shares_headers(&versioned));

        let changed = message.with_header("Foo", "baz").unwrap();
        assert!(!message.shares_headers(&changed));
    }

    #[test]
    fn with_body() {
        let message = Message::new();
        let body = Stream::from_bytes("hello");
        let changed = message.with_body(body.clone());

        assert!(changed.body().ptr_eq(&body));
        assert!(!message.body().ptr_eq(&body));
        assert!(changed.with_protocol_version("1.0").body().ptr_eq(&body));
    }
}
