use bytes::{BufMut, Bytes, BytesMut};
use micro_message::protocol::{MessageError, Response};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::HeadEncoder;

/// One item of an outgoing response.
#[derive(Debug, Clone)]
pub enum Frame<'a> {
    Head(&'a Response),
    Chunk(Bytes),
    Eof,
}

/// Encodes a response as a head followed by any number of chunks and an
/// [`Frame::Eof`]. After `Eof` the encoder accepts the next response.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    head_encoder: HeadEncoder,
    head_sent: bool,
}

impl ResponseEncoder {
    /// An encoder waiting for a response head.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a head was written and its body is not finished yet.
    pub fn in_body(&self) -> bool {
        self.head_sent
    }
}

impl<'a> Encoder<Frame<'a>> for ResponseEncoder {
    type Error = MessageError;

    fn encode(&mut self, item: Frame<'a>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Frame::Head(response) => {
                if self.head_sent {
                    error!("expect body chunk but receive response head");
                    return Err(MessageError::invalid_state("response head already sent"));
                }
                self.head_encoder.encode(response, dst)?;
                self.head_sent = true;
                Ok(())
            }

            Frame::Chunk(chunk) => {
                if !self.head_sent {
                    error!("expect response head but receive body chunk");
                    return Err(MessageError::invalid_state("body chunk before response head"));
                }
                dst.put(chunk);
                Ok(())
            }

            Frame::Eof => {
                if !self.head_sent {
                    error!("expect response head but receive end of body");
                    return Err(MessageError::invalid_state("end of body before response head"));
                }
                self.head_sent = false;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use micro_message::protocol::HttpMessage;

    use super::*;

    #[test]
    fn head_chunks_eof() {
        let response = Response::new().with_header("Content-Length", "5").unwrap();
        let mut encoder = ResponseEncoder::new();
        let mut buf = BytesMut::new();

        encoder.encode(Frame::Head(&response), &mut buf).unwrap();
        assert!(encoder.in_body());
        encoder.encode(Frame::Chunk(Bytes::from_static(b"hel")), &mut buf).unwrap();
        encoder.encode(Frame::Chunk(Bytes::from_static(b"lo")), &mut buf).unwrap();
        encoder.encode(Frame::Eof, &mut buf).unwrap();
        assert!(!encoder.in_body());

        assert_eq!(&buf[..], b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
    }

    #[test]
    fn reusable_after_eof() {
        let response = Response::new();
        let mut encoder = ResponseEncoder::new();
        let mut buf = BytesMut::new();

        for _ in 0..2 {
            encoder.encode(Frame::Head(&response), &mut buf).unwrap();
            encoder.encode(Frame::Eof, &mut buf).unwrap();
        }
        assert_eq!(&buf[..], b"HTTP/1.1 200 OK\r\n\r\nHTTP/1.1 200 OK\r\n\r\n");
    }

    #[test]
    fn out_of_order_frames() {
        let response = Response::new();
        let mut encoder = ResponseEncoder::new();
        let mut buf = BytesMut::new();

        assert!(encoder.encode(Frame::Chunk(Bytes::from_static(b"x")), &mut buf).unwrap_err().is_invalid_state());
        assert!(encoder.encode(Frame::Eof, &mut buf).unwrap_err().is_invalid_state());
        assert!(buf.is_empty());

        encoder.encode(Frame::Head(&response), &mut buf).unwrap();
        let written = buf.len();
        assert!(encoder.encode(Frame::Head(&response), &mut buf).unwrap_err().is_invalid_state());
        assert_eq!(buf.len(), written);
    }
}
