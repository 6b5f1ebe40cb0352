//! Incoming requests as seen by a server application.
//!
//! A [`ServerRequest`] is a [`Request`] plus everything the server learned while
//! receiving it: server parameters, cookies, query parameters, uploaded files, a
//! parsed body and free-form attributes set by the application. Every bag is
//! shared between instances until a `with_*` call replaces it.
//!
//! # Example
//!
//! ```
//! use micro_message::protocol::{HttpRequest, Params, ServerRequest};
//!
//! let server: Params = [("QUERY_STRING".to_string(), "page=2&debug".to_string())].into_iter().collect();
//! let request = ServerRequest::builder("GET", "http://example.org/list?page=2&debug")
//!     .server_params(server)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.query_params()["page"], "2");
//! assert_eq!(request.query_params()["debug"], "");
//!
//! #[derive(Debug, PartialEq)]
//! struct User(&'static str);
//!
//! let tagged = request.with_attribute("user", User("bob"));
//! assert_eq!(tagged.attribute::<User>("user"), Some(&User("bob")));
//! assert!(tagged.attribute::<String>("user").is_none());
//! assert!(request.attribute::<User>("user").is_none());
//! assert_eq!(tagged.method(), "GET");
//! ```

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use triomphe::Arc;

use super::header::HeaderValues;
use super::message::{sealed::Sealed, HttpMessage, Message};
use super::parsed_body::ParsedBody;
use super::request::{sealed::SealedRequest, HttpRequest, Request};
use super::upload::UploadedFiles;
use super::MessageError;
use crate::stream::Stream;
use crate::uri::{IntoUri, Uri};

/// Ordered string parameters: server variables, cookies or query values.
pub type Params = IndexMap<String, String>;

/// Application attributes attached to a request.
pub type Attributes = IndexMap<String, Attribute>;

/// A value of any type an application attaches to a request, e.g. a route
/// match or the authenticated user.
#[derive(Clone)]
pub struct Attribute(std::sync::Arc<dyn Any + Send + Sync>);

impl Attribute {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(std::sync::Arc::new(value))
    }

    /// The value, if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Attribute(..)")
    }
}

/// Server parameter holding the raw query string.
pub const QUERY_STRING: &str = "QUERY_STRING";

/// Splits a raw query string on `&` and each pair on the first `=`.
///
/// Nothing is decoded. A pair without `=` gets an empty value and empty pairs
/// are skipped.
pub fn split_query(raw: &str) -> Params {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ServerRequest {
    request: Request,
    server_params: Arc<Params>,
    cookie_params: Arc<Params>,
    query_params: Arc<Params>,
    uploaded_files: Arc<UploadedFiles>,
    parsed_body: Option<Arc<ParsedBody>>,
    attributes: Arc<Attributes>,
}

impl ServerRequest {
    /// Starts a request with the given method and URI; everything else is optional.
    pub fn builder(method: &str, uri: impl IntoUri) -> ServerRequestBuilder {
        ServerRequestBuilder::new(method, uri)
    }

    /// Server parameters captured when the request was built.
    pub fn server_params(&self) -> &Params {
        &self.server_params
    }

    /// Cookies sent by the client, by name.
    pub fn cookie_params(&self) -> &Params {
        &self.cookie_params
    }

    /// A copy with the cookies replaced; nothing else changes.
    pub fn with_cookie_params(&self, cookies: Params) -> Self {
        Self { cookie_params: Arc::new(cookies), ..self.clone() }
    }

    /// Query parameters, undecoded, in the order they were given.
    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    /// A copy with the query parameters replaced. The URI is left as it is.
    pub fn with_query_params(&self, query: Params) -> Self {
        Self { query_params: Arc::new(query), ..self.clone() }
    }

    /// The uploaded files tree, empty when nothing was uploaded.
    pub fn uploaded_files(&self) -> &UploadedFiles {
        &self.uploaded_files
    }

    /// A copy with the uploaded files replaced.
    pub fn with_uploaded_files(&self, files: UploadedFiles) -> Self {
        Self { uploaded_files: Arc::new(files), ..self.clone() }
    }

    /// The deserialized body, if any.
    pub fn parsed_body(&self) -> Option<&ParsedBody> {
        self.parsed_body.as_deref()
    }

    /// `None` clears the parsed body.
    pub fn with_parsed_body(&self, body: Option<ParsedBody>) -> Self {
        Self { parsed_body: body.map(Arc::new), ..self.clone() }
    }

    /// Sets the parsed body from loosely typed data.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] unless `value` is null, an object
    /// or an array.
    pub fn with_parsed_body_value(&self, value: Value) -> Result<Self, MessageError> {
        Ok(self.with_parsed_body(ParsedBody::from_value(value)?))
    }

    /// Every attribute in insertion order.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The attribute named `name`, if it is set and holds a `T`.
    pub fn attribute<T: Any>(&self, name: &str) -> Option<&T> {
        self.attributes.get(name).and_then(Attribute::downcast_ref)
    }

    /// The attribute, or `default` when it isn't set or holds another type.
    pub fn attribute_or<'a, T: Any>(&'a self, name: &str, default: &'a T) -> &'a T {
        self.attribute(name).unwrap_or(default)
    }

    /// Sets an attribute, replacing any value of any type under the same name.
    pub fn with_attribute(&self, name: impl Into<String>, value: impl Any + Send + Sync) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.attributes).insert(name.into(), Attribute::new(value));
        next
    }

    /// Removes an attribute; a missing one leaves an equal copy.
    pub fn without_attribute(&self, name: &str) -> Self {
        let mut next = self.clone();
        if self.attributes.contains_key(name) {
            Arc::make_mut(&mut next.attributes).shift_remove(name);
        }
        next
    }
}

impl Sealed for ServerRequest {
    fn message(&self) -> &Message {
        self.request.message()
    }

    fn message_mut(&mut self) -> &mut Message {
        self.request.message_mut()
    }
}

impl SealedRequest for ServerRequest {
    fn request(&self) -> &Request {
        &self.request
    }

    fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }
}

impl HttpMessage for ServerRequest {}

impl HttpRequest for ServerRequest {}

/// Collects the parts of a [`ServerRequest`]; [`ServerRequestBuilder::build`]
/// validates them.
#[derive(Debug)]
pub struct ServerRequestBuilder {
    method: String,
    uri: Result<Uri, MessageError>,
    headers: Vec<(String, HeaderValues)>,
    body: Option<Stream>,
    server_params: Params,
    cookie_params: Option<Params>,
    query_params: Option<Params>,
    uploaded_files: UploadedFiles,
    parsed_body: Option<ParsedBody>,
    attributes: Attributes,
}

impl ServerRequestBuilder {
    fn new(method: &str, uri: impl IntoUri) -> Self {
        Self {
            method: method.to_string(),
            uri: uri.into_uri(),
            headers: Vec::new(),
            body: None,
            server_params: Params::new(),
            cookie_params: None,
            query_params: None,
            uploaded_files: UploadedFiles::default(),
            parsed_body: None,
            attributes: Attributes::new(),
        }
    }

    /// Adds a header. Invalid headers are dropped when building.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValues>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn headers<I, N, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<HeaderValues>,
    {
        self.headers.extend(headers.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    /// The body; an empty in-memory stream when not given.
    #[must_use]
    pub fn body(mut self, body: Stream) -> Self {
        self.body = Some(body);
        self
    }

    /// Server variables, also the source of the `QUERY_STRING` fallback.
    #[must_use]
    pub fn server_params(mut self, params: Params) -> Self {
        self.server_params = params;
        self
    }

    /// Cookies; none when not given.
    #[must_use]
    pub fn cookie_params(mut self, cookies: Params) -> Self {
        self.cookie_params = Some(cookies);
        self
    }

    /// Explicit query parameters. Without them the query is split out of the
    /// `QUERY_STRING` server parameter.
    #[must_use]
    pub fn query_params(mut self, query: Params) -> Self {
        self.query_params = Some(query);
        self
    }

    /// The uploaded files tree.
    #[must_use]
    pub fn uploaded_files(mut self, files: UploadedFiles) -> Self {
        self.uploaded_files = files;
        self
    }

    /// The deserialized body.
    #[must_use]
    pub fn parsed_body(mut self, body: ParsedBody) -> Self {
        self.parsed_body = Some(body);
        self
    }

    /// Sets an attribute of any type.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Any + Send + Sync) -> Self {
        self.attributes.insert(name.into(), Attribute::new(value));
        self
    }

    /// # Errors
    ///
    /// Fails with [`MessageError::InvalidArgument`] for an unsupported method or a
    /// URI that didn't parse. Invalid headers are dropped.
    pub fn build(self) -> Result<ServerRequest, MessageError> {
        let request = Request::from_parts(&self.method, self.uri?, self.headers, self.body.unwrap_or_default())?;

        let query_params = self
            .query_params
            .unwrap_or_else(|| self.server_params.get(QUERY_STRING).map(|raw| split_query(raw)).unwrap_or_default());

        Ok(ServerRequest {
            request,
            server_params: Arc::new(self.server_params),
            cookie_params: Arc::new(self.cookie_params.unwrap_or_default()),
            query_params: Arc::new(query_params),
            uploaded_files: Arc::new(self.uploaded_files),
            parsed_body: self.parsed_body.map(Arc::new),
            attributes: Arc::new(self.attributes),
        })
    }
}
