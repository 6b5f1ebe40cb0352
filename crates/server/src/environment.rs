//! The request environment a server request is built from.
//!
//! A CGI-style gateway hands a request over as a set of variables (`REQUEST_METHOD`,
//! `HTTP_HOST`, `QUERY_STRING` and so on), a body on standard input and
//! optionally pre-parsed cookies, query values and uploaded files.
//! [`RequestEnvironment`] collects all of that in one explicit value so the
//! factory never reaches for process-wide state.

use std::io;

use micro_message::protocol::Params;
use micro_message::stream::Stream;
use serde_json::Value;

/// Everything a gateway knows about one request.
#[derive(Debug, Clone, Default)]
pub struct RequestEnvironment {
    server: Params,
    cookies: Option<Params>,
    query: Option<Params>,
    files: Value,
    body: Option<Stream>,
}

impl RequestEnvironment {
    /// An empty environment: no variables, no body.
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment holding the given server variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { server: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(), ..Self::default() }
    }

    /// The environment of a CGI process: its environment variables, with the
    /// body read from standard input.
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars()).with_body(Stream::from_reader(io::stdin()))
    }

    /// Sets one server variable.
    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.server.insert(name.into(), value.into());
        self
    }

    /// The request body; an empty stream when not given.
    #[must_use]
    pub fn with_body(mut self, body: Stream) -> Self {
        self.body = Some(body);
        self
    }

    /// Uploaded files in either the single-file or the multi-file shape:
    ///
    /// ```json
    /// { "avatar": { "tmp_name": "/tmp/a", "size": 10, "error": 0, "name": "a.png", "type": "image/png" },
    ///   "docs":   { "tmp_name": ["/tmp/b", "/tmp/c"], "size": [1, 2], "error": [0, 0],
    ///               "name": ["b.txt", "c.txt"], "type": ["text/plain", "text/plain"] } }
    /// ```
    #[must_use]
    pub fn with_files(mut self, files: Value) -> Self {
        self.files = files;
        self
    }

    /// Cookies parsed by the gateway; without them `HTTP_COOKIE` is parsed.
    #[must_use]
    pub fn with_cookies(mut self, cookies: Params) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Query values parsed by the gateway; without them `QUERY_STRING` is split.
    #[must_use]
    pub fn with_query(mut self, query: Params) -> Self {
        self.query = Some(query);
        self
    }

    /// Every server variable, empty ones included.
    pub fn server(&self) -> &Params {
        &self.server
    }

    /// A server variable, if set and not empty.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.server.get(name).map(String::as_str).filter(|value| !value.is_empty())
    }

    /// Cookies parsed by the gateway, if any.
    pub fn cookies(&self) -> Option<&Params> {
        self.cookies.as_ref()
    }

    /// Query values parsed by the gateway, if any.
    pub fn query(&self) -> Option<&Params> {
        self.query.as_ref()
    }

    /// The upload descriptors, `null` when nothing was uploaded.
    pub fn files(&self) -> &Value {
        &self.files
    }

    /// The request body, if one was given.
    pub fn body(&self) -> Option<&Stream> {
        self.body.as_ref()
    }
}
