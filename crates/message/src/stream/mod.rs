//! Byte streams used as message bodies and upload payloads.
//!
//! A [`Stream`] wraps a [`Resource`] and tracks the state that makes a resource
//! safe to share between messages: whether it's still attached, whether the
//! last read hit the end, and what the resource is able to do.
//!
//! Streams are handles. Cloning one yields a second handle to the *same*
//! resource and cursor, the way two messages created by a `with_*` call keep
//! pointing at one body. Use [`Stream::ptr_eq`] to compare identity.
//!
//! # Example
//!
//! ```
//! use micro_message::stream::Stream;
//!
//! let stream = Stream::temp();
//! stream.write(b"foobar").unwrap();
//! stream.rewind().unwrap();
//! assert_eq!(&stream.contents().unwrap()[..], b"foobar");
//! ```

mod body;
mod resource;

pub use resource::{FileResource, MemoryResource, Metadata, ReaderResource, Resource, WriterResource};

#[cfg(test)]
pub(crate) use resource::MockResource;

use std::fmt;
use std::io::{Read, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::ensure;
use crate::protocol::MessageError;

/// Number of bytes pulled per read when draining a stream.
pub const CHUNK_SIZE: usize = 4096;

/// A shared handle to a readable, writable or seekable byte resource.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    resource: Option<Box<dyn Resource>>,
    /// set once a read returns no bytes; only consulted for non-seekable resources
    eof: bool,
    /// bytes moved through a non-seekable resource
    position: u64,
}

impl Stream {
    /// Wraps a resource.
    pub fn from_resource<R: Resource + 'static>(resource: R) -> Self {
        Self::from_boxed(Box::new(resource))
    }

    /// Wraps an already boxed resource.
    pub fn from_boxed(resource: Box<dyn Resource>) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner { resource: Some(resource), eof: false, position: 0 })) }
    }

    /// An empty in-memory stream that can be written, read back and rewound.
    pub fn temp() -> Self {
        Self::from_resource(MemoryResource::temp())
    }

    /// An in-memory stream holding `bytes`, positioned at the start.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_resource(MemoryResource::from_bytes(bytes.into()))
    }

    /// Opens a file with an fopen-style mode such as `"r"` or `"w+"`.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self, MessageError> {
        Ok(Self::from_resource(FileResource::open(path, mode)?))
    }

    /// A read-only, non-seekable stream over `reader`.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::from_resource(ReaderResource::new(reader))
    }

    /// A write-only, non-seekable stream over `writer`.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::from_resource(WriterResource::new(writer))
    }

    /// Returns true if both handles point at the same underlying stream.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flushes and releases the underlying resource. Closing twice is a no-op.
    pub fn close(&self) {
        if let Some(mut resource) = self.lock().resource.take() {
            if let Err(e) = resource.flush() {
                warn!(cause = %e, "flush failed while closing stream");
            }
            debug!(uri = %resource.metadata().uri, "stream closed");
        }
    }

    /// Separates the underlying resource from the stream without closing it.
    ///
    /// The stream is unusable afterwards; I/O calls fail with
    /// [`MessageError::InvalidState`].
    pub fn detach(&self) -> Option<Box<dyn Resource>> {
        let resource = self.lock().resource.take();
        if resource.is_some() {
            debug!("stream detached");
        }
        resource
    }

    /// Returns true once the stream was closed or detached.
    pub fn is_detached(&self) -> bool {
        self.lock().resource.is_none()
    }

    /// Size in bytes when known; `None` for detached and unsized streams.
    pub fn size(&self) -> Option<u64> {
        self.lock().resource.as_ref().and_then(|r| r.size())
    }

    /// What the resource is and can do; `None` once detached.
    pub fn metadata(&self) -> Option<Metadata> {
        self.lock().resource.as_ref().map(|r| r.metadata())
    }

    /// Returns false once detached.
    pub fn is_seekable(&self) -> bool {
        self.metadata().is_some_and(|m| m.seekable)
    }

    pub fn is_readable(&self) -> bool {
        self.metadata().is_some_and(|m| m.readable)
    }

    pub fn is_writable(&self) -> bool {
        self.metadata().is_some_and(|m| m.writable)
    }

    /// Current position of the read/write cursor.
    pub fn tell(&self) -> Result<u64, MessageError> {
        let mut inner = self.lock();
        let Inner { resource, position, .. } = &mut *inner;
        let resource = attached(resource, "tell")?;
        if resource.metadata().seekable { Ok(resource.seek(SeekFrom::Current(0))?) } else { Ok(*position) }
    }

    /// Returns true if the cursor is at the end of the stream.
    ///
    /// Closed and detached streams are always at the end.
    pub fn eof(&self) -> bool {
        let mut inner = self.lock();
        let Inner { resource, eof, .. } = &mut *inner;
        let Some(resource) = resource.as_deref_mut() else {
            return true;
        };

        if !resource.metadata().seekable {
            return *eof;
        }

        match (resource.size(), resource.seek(SeekFrom::Current(0))) {
            (Some(size), Ok(position)) => position >= size,
            _ => *eof,
        }
    }

    /// Moves the cursor, returning the new position.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidState`] when the stream is detached or not
    /// seekable, and [`MessageError::Io`] when the resource fails.
    pub fn seek(&self, pos: SeekFrom) -> Result<u64, MessageError> {
        let mut inner = self.lock();
        let Inner { resource, eof, .. } = &mut *inner;
        let resource = attached(resource, "seek")?;
        ensure!(resource.metadata().seekable, MessageError::invalid_state("unable to seek: the stream is not seekable"));

        let position = resource.seek(pos)?;
        *eof = false;
        Ok(position)
    }

    /// Seeks back to the start.
    ///
    /// # Errors
    ///
    /// See [`Stream::seek`].
    pub fn rewind(&self) -> Result<(), MessageError> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Writes the whole buffer, returning the number of bytes written.
    pub fn write(&self, buf: &[u8]) -> Result<usize, MessageError> {
        let mut inner = self.lock();
        let Inner { resource, position, .. } = &mut *inner;
        let resource = attached(resource, "write")?;
        ensure!(resource.metadata().writable, MessageError::invalid_state("unable to write: the stream is not writable"));

        let mut written = 0;
        while written < buf.len() {
            match resource.write(&buf[written..])? {
                0 => return Err(MessageError::io(std::io::ErrorKind::WriteZero)),
                n => written += n,
            }
        }
        *position += written as u64;
        Ok(written)
    }

    /// Reads up to `len` bytes. An empty result means the end was reached.
    pub fn read(&self, len: usize) -> Result<Bytes, MessageError> {
        let mut inner = self.lock();
        let Inner { resource, eof, position } = &mut *inner;
        let resource = attached(resource, "read")?;
        ensure!(resource.metadata().readable, MessageError::invalid_state("unable to read: the stream is not readable"));

        let mut buf = BytesMut::zeroed(read_limit(resource, len)?);
        let n = resource.read(&mut buf)?;
        buf.truncate(n);
        if n == 0 && len > 0 {
            *eof = true;
        }
        *position += n as u64;
        Ok(buf.freeze())
    }

    /// Reads everything from the current position to the end.
    pub fn contents(&self) -> Result<Bytes, MessageError> {
        let mut contents = BytesMut::new();
        loop {
            let chunk = self.read(CHUNK_SIZE)?;
            if chunk.is_empty() {
                return Ok(contents.freeze());
            }
            contents.extend_from_slice(&chunk);
        }
    }
}

/// How many bytes a single read of `len` may need: what's left of a sized,
/// seekable resource, at most one chunk otherwise.
fn read_limit(resource: &mut dyn Resource, len: usize) -> Result<usize, MessageError> {
    if !resource.metadata().seekable {
        return Ok(len.min(CHUNK_SIZE));
    }
    let Some(size) = resource.size() else {
        return Ok(len.min(CHUNK_SIZE));
    };
    let remaining = size.saturating_sub(resource.seek(SeekFrom::Current(0))?);
    Ok(usize::try_from(remaining).map_or(len, |remaining| len.min(remaining)))
}

fn attached<'a>(
    resource: &'a mut Option<Box<dyn Resource>>,
    op: &str,
) -> Result<&'a mut (dyn Resource + 'static), MessageError> {
    match resource.as_deref_mut() {
        Some(resource) => Ok(resource),
        None => Err(MessageError::invalid_state(format!("unable to {op}: the stream is detached or closed"))),
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::temp()
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").field("metadata", &self.metadata()).finish()
    }
}

/// Renders the entire stream, rewinding first when possible.
///
/// Rendering never fails: an unreadable stream renders as nothing.
impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = || -> Result<Bytes, MessageError> {
            if self.is_seekable() {
                self.rewind()?;
            }
            self.contents()
        };

        match render() {
            Ok(bytes) => f.write_str(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                warn!(cause = %e, "unable to render stream contents");
                Ok(())
            }
        }
    }
}
