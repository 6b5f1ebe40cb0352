use bytes::BytesMut;
use micro_message::protocol::{HttpMessage, MessageError, Response};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::debug;

use crate::codec::{Frame, ResponseEncoder};
use crate::transmitter::{body_chunks, TransmitterConfig};

/// Writes responses to a tokio writer.
///
/// Body chunks are read from the response's [`Stream`](micro_message::stream::Stream)
/// synchronously between writes.
#[derive(Debug)]
pub struct AsyncResponseTransmitter<W> {
    writer: W,
    buffer: BytesMut,
    encoder: ResponseEncoder,
    config: TransmitterConfig,
}

impl<W> AsyncResponseTransmitter<W>
where
    W: AsyncWrite + Unpin,
{
    /// A transmitter over `writer` with the default [`TransmitterConfig`].
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, TransmitterConfig::default())
    }

    /// A transmitter over `writer` sending bodies as `config` says.
    pub fn with_config(writer: W, config: TransmitterConfig) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(config.chunk_size), encoder: ResponseEncoder::new(), config }
    }

    /// The underlying writer.
    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Gives the writer back.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes the head and the whole body, returning the number of body bytes sent.
    ///
    /// # Errors
    ///
    /// Fails when the body can't be read or the writer fails.
    pub async fn send(&mut self, response: &Response) -> Result<u64, MessageError> {
        self.buffer.clear();
        self.encoder = ResponseEncoder::new();

        self.encoder.encode(Frame::Head(response), &mut self.buffer)?;
        self.flush().await?;
        debug!(status = response.status_code(), "response head written");

        let mut sent = 0;
        for chunk in body_chunks(response.body(), self.config)? {
            let chunk = chunk?;
            sent += chunk.len() as u64;
            self.encoder.encode(Frame::Chunk(chunk), &mut self.buffer)?;
            self.flush().await?;
        }

        self.encoder.encode(Frame::Eof, &mut self.buffer)?;
        self.writer.flush().await?;
        debug!(status = response.status_code(), bytes = sent, "response sent");
        Ok(sent)
    }

    #[inline]
    async fn flush(&mut self) -> Result<(), MessageError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.writer.write_all(self.buffer.as_ref()).await?;
        self.buffer.clear();
        Ok(())
    }
}
