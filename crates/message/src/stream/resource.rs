//! Byte resources a [`Stream`](super::Stream) can wrap.
//!
//! A [`Resource`] is the raw capability underneath a stream: something that can be
//! read, written and positioned. The stream layers state tracking (detach, EOF,
//! capability checks) on top; resources only move bytes.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::ensure;
use crate::protocol::MessageError;

/// Describes what a resource is and what it can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Where the bytes live, e.g. `memory`, `temp`, a file path, `reader`.
    pub uri: String,
    /// The fopen-style mode the resource was opened with.
    pub mode: String,
    pub readable: bool,
    pub writable: bool,
    pub seekable: bool,
}

/// The low-level byte capability wrapped by a stream.
///
/// Implementations are blocking. Callers are expected to consult [`Resource::metadata`]
/// before reading, writing or seeking; implementations lacking a capability should
/// answer with an [`ErrorKind::Unsupported`] error.
#[cfg_attr(test, mockall::automock)]
pub trait Resource: Send {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    fn flush(&mut self) -> io::Result<()>;

    /// Total size in bytes, when it can be known.
    fn size(&self) -> Option<u64>;

    fn metadata(&self) -> Metadata;
}

/// An in-memory, growable, readable, writable and seekable buffer.
#[derive(Debug, Clone)]
pub struct MemoryResource {
    cursor: Cursor<Vec<u8>>,
    uri: &'static str,
}

impl MemoryResource {
    /// An empty scratch buffer.
    pub fn temp() -> Self {
        Self { cursor: Cursor::new(Vec::new()), uri: "temp" }
    }

    /// A buffer pre-filled with `bytes`, positioned at the start.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { cursor: Cursor::new(bytes), uri: "memory" }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl Resource for MemoryResource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.cursor.write(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn size(&self) -> Option<u64> {
        Some(self.cursor.get_ref().len() as u64)
    }

    fn metadata(&self) -> Metadata {
        Metadata { uri: self.uri.to_string(), mode: "w+b".to_string(), readable: true, writable: true, seekable: true }
    }
}

/// A file on disk opened with an fopen-style mode string.
#[derive(Debug)]
pub struct FileResource {
    file: File,
    path: String,
    mode: String,
    readable: bool,
    writable: bool,
}

impl FileResource {
    /// Opens `path` with one of the modes `r`, `w`, `a`, `x`, `c`, each optionally
    /// followed by `+` and the ignored `b`/`t` flags.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self, MessageError> {
        let path = path.as_ref();
        let access = FileMode::parse(mode)?;
        let file = access.options().open(path)?;
        Ok(Self {
            file,
            path: path.display().to_string(),
            mode: mode.to_string(),
            readable: access.readable,
            writable: access.writable,
        })
    }
}

impl Resource for FileResource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    fn size(&self) -> Option<u64> {
        self.file.metadata().ok().map(|m| m.len())
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            uri: self.path.clone(),
            mode: self.mode.clone(),
            readable: self.readable,
            writable: self.writable,
            seekable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileMode {
    kind: u8,
    readable: bool,
    writable: bool,
}

impl FileMode {
    fn parse(mode: &str) -> Result<Self, MessageError> {
        let mut chars = mode.chars();
        let kind = match chars.next() {
            Some(c @ ('r' | 'w' | 'a' | 'x' | 'c')) => c as u8,
            _ => return Err(MessageError::invalid_argument(format!("unsupported stream mode: {mode:?}"))),
        };

        let mut plus = false;
        for flag in chars {
            match flag {
                '+' if !plus => plus = true,
                'b' | 't' => {}
                _ => return Err(MessageError::invalid_argument(format!("unsupported stream mode: {mode:?}"))),
            }
        }

        let readable = kind == b'r' || plus;
        let writable = kind != b'r' || plus;
        ensure!(readable || writable, MessageError::invalid_argument(format!("unsupported stream mode: {mode:?}")));
        Ok(Self { kind, readable, writable })
    }

    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.readable);
        match self.kind {
            b'r' => options.write(self.writable),
            b'w' => options.write(true).create(true).truncate(true),
            b'a' => options.append(true).create(true),
            b'x' => options.write(true).create_new(true),
            _ => options.write(true).create(true),
        };
        options
    }
}

/// A read-only, forward-only source such as standard input.
pub struct ReaderResource<R> {
    reader: R,
}

impl<R> ReaderResource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R> fmt::Debug for ReaderResource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderResource").finish_non_exhaustive()
    }
}

impl<R: Read + Send> Resource for ReaderResource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }

    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(ErrorKind::Unsupported.into())
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(ErrorKind::Unsupported.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn size(&self) -> Option<u64> {
        None
    }

    fn metadata(&self) -> Metadata {
        Metadata { uri: "reader".to_string(), mode: "rb".to_string(), readable: true, writable: false, seekable: false }
    }
}

/// A write-only sink such as standard output.
pub struct WriterResource<W> {
    writer: W,
}

impl<W> WriterResource<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W> fmt::Debug for WriterResource<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterResource").finish_non_exhaustive()
    }
}

impl<W: Write + Send> Resource for WriterResource<W> {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(ErrorKind::Unsupported.into())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(ErrorKind::Unsupported.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn size(&self) -> Option<u64> {
        None
    }

    fn metadata(&self) -> Metadata {
        Metadata { uri: "writer".to_string(), mode: "wb".to_string(), readable: false, writable: true, seekable: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_modes() {
        let mode = FileMode::parse("r").unwrap();
        assert!(mode.readable && !mode.writable);

        let mode = FileMode::parse("rb+").unwrap();
        assert!(mode.readable && mode.writable);

        let mode = FileMode::parse("w").unwrap();
        assert!(!mode.readable && mode.writable);

        let mode = FileMode::parse("a+").unwrap();
        assert!(mode.readable && mode.writable);

        assert!(FileMode::parse("").unwrap_err().is_invalid_argument());
        assert!(FileMode::parse("z").unwrap_err().is_invalid_argument());
        assert!(FileMode::parse("r++").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn memory_resource_tracks_size() {
        let mut resource = MemoryResource::temp();
        assert_eq!(resource.size(), Some(0));
        assert_eq!(resource.write(b"foo").unwrap(), 3);
        assert_eq!(resource.size(), Some(3));
        assert_eq!(resource.metadata().uri, "temp");
        assert!(resource.metadata().seekable);
    }

    #[test]
    fn reader_resource_is_read_only() {
        let mut resource = ReaderResource::new(&b"abc"[..]);
        let meta = resource.metadata();
        assert!(meta.readable && !meta.writable && !meta.seekable);
        assert_eq!(resource.write(b"x").unwrap_err().kind(), ErrorKind::Unsupported);

        let mut buf = [0u8; 8];
        assert_eq!(resource.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn file_resource_round_trip() {
        let path = std::env::temp_dir().join(format!("micro-message-resource-{}.txt", std::process::id()));
        {
            let mut resource = FileResource::open(&path, "w+").unwrap();
            assert_eq!(resource.write(b"hello").unwrap(), 5);
            assert_eq!(resource.size(), Some(5));
            resource.seek(SeekFrom::Start(0)).unwrap();
            let mut buf = [0u8; 5];
            assert_eq!(resource.read(&mut buf).unwrap(), 5);
            assert_eq!(&buf, b"hello");
        }

        let resource = FileResource::open(&path, "r").unwrap();
        let meta = resource.metadata();
        assert!(meta.readable && !meta.writable);
        assert_eq!(meta.mode, "r");

        std::fs::remove_file(&path).unwrap();
    }
}
