//! A CGI program echoing what it received.
//!
//! Try it without a web server:
//!
//! ```sh
//! REQUEST_METHOD=POST CONTENT_TYPE=application/json HTTP_HOST=localhost \
//!   REQUEST_URI='/echo?lang=rust' QUERY_STRING='lang=rust' \
//!   cargo run --example cgi <<< '{"name": "bob"}'
//! ```

use std::io;

use micro_message::protocol::{HttpMessage, HttpRequest, Response, ServerRequest};
use micro_message::stream::Stream;
use micro_message_server::environment::RequestEnvironment;
use micro_message_server::factory::{DefaultServerRequestFactory, ServerRequestFactory};
use micro_message_server::transmitter::ResponseTransmitter;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).with_writer(io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let env = RequestEnvironment::from_process();
    let response = match DefaultServerRequestFactory::default().build_server_request(&env) {
        Ok(request) => echo(&request),
        Err(e) => {
            error!(cause = %e, "unable to build server request");
            Response::with_code(400).expect("400 is a valid status code")
        }
    };

    let mut transmitter = ResponseTransmitter::new(io::stdout().lock());
    match transmitter.send(&response) {
        Ok(bytes) => info!(status = response.status_code(), bytes, "response sent"),
        Err(e) => error!(cause = %e, "failed to send response"),
    }
}

fn echo(request: &ServerRequest) -> Response {
    info!(method = %request.method(), uri = %request.uri(), "request received");

    let mut text = format!("{} {}\n", request.method(), request.request_target());
    for (name, values) in request.headers() {
        text.push_str(&format!("{name}: {}\n", values.join(",")));
    }
    for (name, value) in request.query_params() {
        text.push_str(&format!("query {name} = {value}\n"));
    }
    if let Some(body) = request.parsed_body() {
        text.push_str(&format!("parsed body {body:?}\n"));
    }

    Response::new()
        .with_header("Content-Type", "text/plain; charset=utf-8")
        .expect("static header is valid")
        .with_body(Stream::from_bytes(text))
}
