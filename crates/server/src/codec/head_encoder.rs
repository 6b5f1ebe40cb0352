//! Response head serialization.
//!
//! Writes `HTTP/{version} {code} {reason}\r\n`, one `Name: v1,v2\r\n` line per
//! header in insertion order with the name as it was last set, and the blank line
//! ending the head.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use micro_message::protocol::{HttpMessage, MessageError, Response};
use tokio_util::codec::Encoder;

/// Initial buffer size reserved for the head
const INIT_HEAD_SIZE: usize = 4 * 1024;

/// Encoder for the status line and header block of a [`Response`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadEncoder;

impl<'a> Encoder<&'a Response> for HeadEncoder {
    type Error = MessageError;

    fn encode(&mut self, response: &'a Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEAD_SIZE);

        write!(
            FastWrite(dst),
            "HTTP/{} {} {}\r\n",
            response.protocol_version(),
            response.status_code(),
            response.reason_phrase()
        )?;

        for (name, values) in response.headers() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    dst.put_u8(b',');
                }
                dst.put_slice(value.as_bytes());
            }
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// `io::Write` over a `BytesMut` whose capacity was already reserved.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
