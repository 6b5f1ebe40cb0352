//! [`http_body::Body`] support for [`Stream`], so message bodies can be handed to
//! anything speaking the `http` crate family.
//!
//! Reads are blocking against the underlying resource; each poll yields at most
//! [`CHUNK_SIZE`] bytes.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};

use super::{Stream, CHUNK_SIZE};
use crate::protocol::MessageError;

impl Body for Stream {
    type Data = Bytes;
    type Error = MessageError;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut().read(CHUNK_SIZE) {
            Ok(bytes) if bytes.is_empty() => Poll::Ready(None),
            Ok(bytes) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
            Err(e) => Poll::Ready(Some(Err(e))),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.is_seekable() && self.eof()
    }

    fn size_hint(&self) -> SizeHint {
        match (self.is_seekable(), self.size(), self.tell()) {
            (true, Some(size), Ok(position)) => SizeHint::with_exact(size.saturating_sub(position)),
            _ => SizeHint::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use http_body_util::BodyExt;

    use super::*;

    #[test]
    fn collects_remaining_bytes() {
        let stream = Stream::from_bytes("Hello world");
        assert_eq!(stream.size_hint().exact(), Some(11));
        assert!(!stream.is_end_stream());

        let bytes = block_on(stream.clone().collect()).unwrap().to_bytes();
        assert_eq!(bytes, Bytes::from("Hello world"));
        assert!(stream.is_end_stream());
        assert_eq!(stream.size_hint().exact(), Some(0));
    }

    #[test]
    fn yields_fixed_size_frames() {
        let stream = Stream::from_bytes(vec![b'x'; CHUNK_SIZE + 10]);
        let mut body = stream;

        let first = block_on(body.frame()).unwrap().unwrap().into_data().unwrap();
        assert_eq!(first.len(), CHUNK_SIZE);
        let second = block_on(body.frame()).unwrap().unwrap().into_data().unwrap();
        assert_eq!(second.len(), 10);
        assert!(block_on(body.frame()).is_none());
    }

    #[test]
    fn detached_stream_errors() {
        let stream = Stream::from_bytes("abc");
        stream.detach();
        let mut body = stream;
        let frame = block_on(body.frame()).unwrap();
        assert!(frame.unwrap_err().is_invalid_state());
    }

    #[test]
    fn reader_stream_has_no_exact_size() {
        let stream = Stream::from_reader(&b"abc"[..]);
        assert_eq!(stream.size_hint().exact(), None);
        assert!(!stream.is_end_stream());
    }
}
