//! Building [`ServerRequest`]s from a [`RequestEnvironment`].
//!
//! The [`DefaultServerRequestFactory`] reads CGI-style variables:
//!
//! - method from `REQUEST_METHOD`
//! - URI from `HTTPS`, `HTTP_HOST` (or `SERVER_NAME` and `SERVER_PORT`),
//!   `REQUEST_URI` and `QUERY_STRING`
//! - headers from every `HTTP_*` variable plus `CONTENT_TYPE`, `CONTENT_LENGTH`
//!   and `CONTENT_MD5`, e.g. `HTTP_X_REQUESTED_WITH` becomes `X-Requested-With`
//! - cookies from `HTTP_COOKIE` unless the environment carries parsed ones
//! - form and JSON bodies of `POST` requests into a [`ParsedBody`]
//! - uploads from the environment's file descriptors, see [`normalize_files`]

mod uploads;
pub use uploads::normalize_files;

use micro_message::protocol::{HeaderValues, MessageError, Params, ParsedBody, ServerRequest};
use micro_message::stream::Stream;
use micro_message::uri::standard_port;
use tracing::{debug, warn};

use crate::environment::RequestEnvironment;

/// Builds a [`ServerRequest`] out of the environment a gateway provides.
pub trait ServerRequestFactory {
    /// Builds the request `env` describes.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidArgument`] for an unsupported method or a URI that
    /// can't be parsed, and the upload errors of [`normalize_files`].
    fn build_server_request(&self, env: &RequestEnvironment) -> Result<ServerRequest, MessageError>;
}

/// Tunables of the [`DefaultServerRequestFactory`].
#[derive(Debug, Clone)]
pub struct FactoryConfig {
    header_prefix: String,
    default_method: String,
    default_host: String,
    parse_body: bool,
}

impl FactoryConfig {
    /// Prefix marking a variable as a request header, `HTTP_` by default.
    #[must_use]
    pub fn header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = prefix.into();
        self
    }

    /// Method used when `REQUEST_METHOD` is missing, `GET` by default.
    #[must_use]
    pub fn default_method(mut self, method: impl Into<String>) -> Self {
        self.default_method = method.into();
        self
    }

    /// Host used when neither `HTTP_HOST` nor `SERVER_NAME` is set.
    #[must_use]
    pub fn default_host(mut self, host: impl Into<String>) -> Self {
        self.default_host = host.into();
        self
    }

    /// Whether form and JSON bodies get parsed, on by default.
    #[must_use]
    pub fn parse_body(mut self, parse: bool) -> Self {
        self.parse_body = parse;
        self
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            header_prefix: "HTTP_".to_string(),
            default_method: "GET".to_string(),
            default_host: "localhost".to_string(),
            parse_body: true,
        }
    }
}

/// Variables that describe the body and become headers without a prefix.
const CONTENT_VARS: [&str; 3] = ["CONTENT_TYPE", "CONTENT_LENGTH", "CONTENT_MD5"];

/// Reads the CGI variables listed in the module docs.
#[derive(Debug, Clone, Default)]
pub struct DefaultServerRequestFactory {
    config: FactoryConfig,
}

impl DefaultServerRequestFactory {
    /// A factory using `config`.
    pub fn new(config: FactoryConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    fn method<'a>(&'a self, env: &'a RequestEnvironment) -> &'a str {
        env.var("REQUEST_METHOD").unwrap_or(&self.config.default_method)
    }

    fn uri(&self, env: &RequestEnvironment) -> String {
        let secure = env.var("HTTPS").is_some_and(|https| !https.eq_ignore_ascii_case("off"));
        let scheme = if secure { "https" } else { "http" };

        let host = match (env.var("HTTP_HOST"), env.var("SERVER_NAME")) {
            (Some(host), _) => host.to_string(),
            (None, Some(name)) => match env.var("SERVER_PORT").and_then(|port| port.parse::<u16>().ok()) {
                Some(port) if standard_port(scheme) != Some(port) => format!("{name}:{port}"),
                _ => name.to_string(),
            },
            (None, None) => self.config.default_host.clone(),
        };

        let target = match env.var("REQUEST_URI") {
            Some(target) => target.to_string(),
            None => match env.var("QUERY_STRING") {
                Some(query) => format!("/?{query}"),
                None => "/".to_string(),
            },
        };

        format!("{scheme}://{host}{target}")
    }

    fn headers(&self, env: &RequestEnvironment) -> Vec<(String, HeaderValues)> {
        env.server()
            .iter()
            .filter_map(|(key, value)| {
                let name = match key.strip_prefix(self.config.header_prefix.as_str()) {
                    Some(rest) if !rest.is_empty() => rest,
                    _ if CONTENT_VARS.contains(&key.as_str()) => key.as_str(),
                    _ => return None,
                };
                Some((header_name(name), HeaderValues::from(value)))
            })
            .collect()
    }

    /// Parses `POST` form and JSON bodies. The body stays readable afterwards:
    /// seekable bodies are rewound, others are replaced by the bytes read.
    fn parse_body(&self, method: &str, env: &RequestEnvironment, body: &Stream) -> (Option<ParsedBody>, Option<Stream>) {
        if !self.config.parse_body || !method.eq_ignore_ascii_case("POST") {
            return (None, None);
        }

        let Some(content_type) = env.var("CONTENT_TYPE").and_then(|value| value.parse::<mime::Mime>().ok()) else {
            return (None, None);
        };

        let is_form = content_type.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str();
        let is_json = content_type.essence_str() == mime::APPLICATION_JSON.essence_str()
            || content_type.suffix() == Some(mime::JSON);
        if !is_form && !is_json {
            return (None, None);
        }

        let bytes = match body.contents() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(cause = %e, "unable to read request body");
                return (None, None);
            }
        };

        let replacement = if body.is_seekable() {
            if let Err(e) = body.rewind() {
                warn!(cause = %e, "unable to rewind request body");
            }
            None
        } else {
            Some(Stream::from_bytes(bytes.to_vec()))
        };

        let parsed = if is_form { ParsedBody::from_form(&bytes).map(Some) } else { ParsedBody::from_json(&bytes) };
        match parsed {
            Ok(parsed) => {
                debug!(content_type = %content_type, "request body parsed");
                (parsed, replacement)
            }
            Err(e) => {
                warn!(cause = %e, content_type = %content_type, "ignoring unparsable request body");
                (None, replacement)
            }
        }
    }
}

impl ServerRequestFactory for DefaultServerRequestFactory {
    fn build_server_request(&self, env: &RequestEnvironment) -> Result<ServerRequest, MessageError> {
        let method = self.method(env);
        let uri = self.uri(env);
        let body = env.body().cloned().unwrap_or_default();

        let cookies = match env.cookies() {
            Some(cookies) => cookies.clone(),
            None => env.var("HTTP_COOKIE").map(parse_cookies).unwrap_or_default(),
        };

        let (parsed_body, replaced_body) = self.parse_body(method, env, &body);

        let mut builder = ServerRequest::builder(method, uri.as_str())
            .headers(self.headers(env))
            .body(replaced_body.unwrap_or(body))
            .server_params(env.server().clone())
            .cookie_params(cookies)
            .uploaded_files(normalize_files(env.files())?);

        if let Some(query) = env.query() {
            builder = builder.query_params(query.clone());
        }
        if let Some(parsed_body) = parsed_body {
            builder = builder.parsed_body(parsed_body);
        }

        let request = builder.build()?;
        debug!(method = %method, uri = %uri, "server request built");
        Ok(request)
    }
}

/// `HTTP_X_REQUESTED_WITH` style keys to `X-Requested-With` style names.
fn header_name(key: &str) -> String {
    key.split('_')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Splits a `Cookie` header of `name=value` pairs separated by `;`.
fn parse_cookies(header: &str) -> Params {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
