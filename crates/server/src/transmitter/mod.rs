//! Sending a [`Response`](micro_message::protocol::Response) over an output channel.
//!
//! Both transmitters write the head, then stream the body in
//! [`TransmitterConfig::chunk_size`] pieces until it is exhausted. A seekable
//! body is rewound first unless [`TransmitterConfig::rewind_body`] is off.
//!
//! - [`ResponseTransmitter`]: blocking, over any `std::io::Write`
//! - [`AsyncResponseTransmitter`]: over any tokio `AsyncWrite`

mod async_writer;
mod writer;

pub use async_writer::AsyncResponseTransmitter;
pub use writer::ResponseTransmitter;

use bytes::Bytes;
use micro_message::protocol::MessageError;
use micro_message::stream::{Stream, CHUNK_SIZE};
use tracing::trace;

/// How transmitters send response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitterConfig {
    chunk_size: usize,
    rewind_body: bool,
}

impl TransmitterConfig {
    /// Bytes read from the body per chunk, at least one.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Whether a seekable body is rewound before sending, on by default.
    #[must_use]
    pub fn rewind_body(mut self, rewind: bool) -> Self {
        self.rewind_body = rewind;
        self
    }
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self { chunk_size: CHUNK_SIZE, rewind_body: true }
    }
}

/// Positions the body for sending and yields it chunk by chunk.
fn body_chunks<'a>(
    body: &'a Stream,
    config: TransmitterConfig,
) -> Result<impl Iterator<Item = Result<Bytes, MessageError>> + 'a, MessageError> {
    if config.rewind_body && body.is_seekable() {
        body.rewind()?;
    }

    let chunk_size = config.chunk_size;
    let mut done = false;
    Ok(std::iter::from_fn(move || {
        if done {
            return None;
        }
        match body.read(chunk_size) {
            Ok(chunk) if chunk.is_empty() => {
                done = true;
                None
            }
            Ok(chunk) => {
                trace!(len = chunk.len(), "body chunk read");
                Some(Ok(chunk))
            }
            Err(e) => {
                done = true;
                Some(Err(e))
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::io::SeekFrom;

    use super::*;

    #[test]
    fn default_config() {
        let config = TransmitterConfig::default();
        assert_eq!(config.chunk_size, 4096);
        assert!(config.rewind_body);
        assert_eq!(config.chunk_size(0).chunk_size, 1);
    }

    #[test]
    fn chunks_in_configured_size() {
        let body = Stream::from_bytes("abcdefg");
        body.seek(SeekFrom::End(0)).unwrap();

        let config = TransmitterConfig::default().chunk_size(3);
        let chunks = body_chunks(&body, config).unwrap().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(chunks, vec![Bytes::from_static(b"abc"), Bytes::from_static(b"def"), Bytes::from_static(b"g")]);
    }

    #[test]
    fn without_rewind_sends_the_rest() {
        let body = Stream::from_bytes("abcdefg");
        body.seek(SeekFrom::Start(4)).unwrap();

        let config = TransmitterConfig::default().rewind_body(false);
        let chunks = body_chunks(&body, config).unwrap().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(chunks, vec![Bytes::from_static(b"efg")]);
    }

    #[test]
    fn detached_body_fails() {
        let body = Stream::from_bytes("abc");
        assert!(body.detach().is_some());

        let chunks = body_chunks(&body, TransmitterConfig::default()).unwrap();
        assert!(chunks.collect::<Result<Vec<_>, _>>().unwrap_err().is_invalid_state());
    }
}
