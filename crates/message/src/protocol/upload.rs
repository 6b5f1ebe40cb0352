//! Uploaded files and the tree they're delivered in.

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, info};

use super::MessageError;
use crate::ensure;
use crate::stream::{Stream, CHUNK_SIZE};

/// Outcome of a single file upload, one of the codes `0` to `8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UploadErrorCode(u8);

impl UploadErrorCode {
    pub const OK: Self = Self(0);
    /// The file exceeds the server's configured size limit.
    pub const INI_SIZE: Self = Self(1);
    /// The file exceeds the form's declared size limit.
    pub const FORM_SIZE: Self = Self(2);
    pub const PARTIAL: Self = Self(3);
    pub const NO_FILE: Self = Self(4);
    pub const NO_TMP_DIR: Self = Self(6);
    pub const CANT_WRITE: Self = Self(7);
    /// An extension stopped the upload.
    pub const EXTENSION: Self = Self(8);

    /// The numeric code.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Returns true for [`UploadErrorCode::OK`].
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// A human readable explanation of the code.
    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "the file uploaded successfully",
            1 => "the file exceeds the server's maximum upload size",
            2 => "the file exceeds the form's maximum upload size",
            3 => "the file was only partially uploaded",
            4 => "no file was uploaded",
            6 => "missing a temporary folder",
            7 => "failed to write the file to disk",
            8 => "an extension stopped the file upload",
            _ => "unknown upload error",
        }
    }
}

impl TryFrom<i64> for UploadErrorCode {
    type Error = MessageError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match u8::try_from(code) {
            Ok(code @ 0..=8) => Ok(Self(code)),
            _ => Err(MessageError::invalid_argument(format!("{code} is not a valid upload error code"))),
        }
    }
}

impl fmt::Display for UploadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.description())
    }
}

#[derive(Debug)]
enum Source {
    Stream(Stream),
    /// A file the server already wrote to disk; the stream is opened on first use.
    TempPath { path: PathBuf, stream: Option<Stream> },
}

/// One uploaded file.
///
/// The content can be moved out exactly once with [`UploadedFile::move_to`];
/// after that both `move_to` and [`UploadedFile::stream`] fail with
/// [`MessageError::InvalidState`].
pub struct UploadedFile {
    /// `None` once the file was moved
    source: Mutex<Option<Source>>,
    size: Option<u64>,
    error: UploadErrorCode,
    client_filename: Option<String>,
    client_media_type: Option<String>,
}

impl UploadedFile {
    pub fn new(
        stream: Stream,
        size: Option<u64>,
        error: UploadErrorCode,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Self {
        Self::with_source(Source::Stream(stream), size, error, client_filename, client_media_type)
    }

    /// An upload backed by a temporary file; moving it renames the file.
    pub fn from_temp_path(
        path: impl Into<PathBuf>,
        size: Option<u64>,
        error: UploadErrorCode,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Self {
        let source = Source::TempPath { path: path.into(), stream: None };
        Self::with_source(source, size, error, client_filename, client_media_type)
    }

    fn with_source(
        source: Source,
        size: Option<u64>,
        error: UploadErrorCode,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Self {
        Self { source: Mutex::new(Some(source)), size, error, client_filename, client_media_type }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Source>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The uploaded content.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidState`] once the file was moved, or when a
    /// temporary file can't be opened.
    pub fn stream(&self) -> Result<Stream, MessageError> {
        let mut source = self.lock();
        match source.as_mut() {
            None => Err(MessageError::invalid_state("unable to get the stream: the file has already been moved")),
            Some(Source::Stream(stream)) => Ok(stream.clone()),
            Some(Source::TempPath { path, stream }) => {
                if let Some(stream) = stream {
                    return Ok(stream.clone());
                }
                let opened = Stream::open(&*path, "rb").map_err(|e| {
                    MessageError::invalid_state(format!("unable to get the stream for {}: {e}", path.display()))
                })?;
                *stream = Some(opened.clone());
                Ok(opened)
            }
        }
    }

    /// Moves the content to `target`. Temporary files are renamed, falling back
    /// to copy and delete; stream-backed uploads are copied chunk by chunk.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidArgument`] for an empty target,
    /// [`MessageError::InvalidState`] if the file was already moved, and
    /// [`MessageError::Io`] if the copy fails. A failed move can be retried.
    pub fn move_to(&self, target: impl AsRef<Path>) -> Result<(), MessageError> {
        let target = target.as_ref();
        ensure!(
            !target.as_os_str().is_empty(),
            MessageError::invalid_argument("the target path for an uploaded file must not be empty")
        );

        let mut source = self.lock();
        match source.as_mut() {
            None => {
                return Err(MessageError::invalid_state("unable to move the file: it has already been moved"));
            }
            Some(Source::Stream(stream)) => copy_stream(stream, target)?,
            Some(Source::TempPath { path, stream }) => {
                if let Some(stream) = stream.take() {
                    stream.close();
                }
                relocate(path, target)?;
            }
        }

        *source = None;
        info!(path = %target.display(), "uploaded file moved");
        Ok(())
    }

    /// Returns true once [`UploadedFile::move_to`] succeeded.
    pub fn is_moved(&self) -> bool {
        self.lock().is_none()
    }

    /// Declared size in bytes, if known.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// The upload outcome reported by the gateway.
    pub fn error(&self) -> UploadErrorCode {
        self.error
    }

    /// File name sent by the client. Don't trust it.
    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    /// Media type sent by the client. Don't trust it either.
    pub fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }
}

/// Renames `from` to `to`, copying and deleting when a rename isn't possible,
/// e.g. across file systems.
fn relocate(from: &Path, to: &Path) -> Result<(), MessageError> {
    if let Err(e) = fs::rename(from, to) {
        debug!(cause = %e, from = %from.display(), "rename failed, copying uploaded file instead");
        copy_and_remove(from, to)?;
    }
    Ok(())
}

fn copy_and_remove(from: &Path, to: &Path) -> Result<(), MessageError> {
    fs::copy(from, to)?;
    fs::remove_file(from)?;
    Ok(())
}

fn copy_stream(stream: &Stream, target: &Path) -> Result<(), MessageError> {
    if stream.is_seekable() {
        stream.rewind()?;
    }

    let mut file = File::create(target)?;
    loop {
        let chunk = stream.read(CHUNK_SIZE)?;
        if chunk.is_empty() {
            break;
        }
        file.write_all(&chunk)?;
    }
    file.flush()?;
    Ok(())
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("size", &self.size)
            .field("error", &self.error)
            .field("client_filename", &self.client_filename)
            .field("client_media_type", &self.client_media_type)
            .field("moved", &self.is_moved())
            .finish()
    }
}

/// A tree of uploaded files, shaped like the form fields they came from.
#[derive(Debug, Clone)]
pub enum UploadedFiles {
    File(Arc<UploadedFile>),
    List(Vec<UploadedFiles>),
    Map(IndexMap<String, UploadedFiles>),
}

impl UploadedFiles {
    /// Number of files in the tree.
    pub fn len(&self) -> usize {
        match self {
            UploadedFiles::File(_) => 1,
            UploadedFiles::List(items) => items.iter().map(UploadedFiles::len).sum(),
            UploadedFiles::Map(items) => items.values().map(UploadedFiles::len).sum(),
        }
    }

    /// Returns true when the tree holds no file.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A child by field name, or by index for lists.
    pub fn get(&self, key: &str) -> Option<&UploadedFiles> {
        match self {
            UploadedFiles::File(_) => None,
            UploadedFiles::List(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
            UploadedFiles::Map(items) => items.get(key),
        }
    }

    /// The file, if this node is a single file rather than a list or map.
    pub fn as_file(&self) -> Option<&Arc<UploadedFile>> {
        match self {
            UploadedFiles::File(file) => Some(file),
            _ => None,
        }
    }

    /// Every file in the tree, depth first.
    pub fn iter_files(&self) -> impl Iterator<Item = &Arc<UploadedFile>> {
        let mut files = Vec::new();
        self.collect_files(&mut files);
        files.into_iter()
    }

    fn collect_files<'a>(&'a self, files: &mut Vec<&'a Arc<UploadedFile>>) {
        match self {
            UploadedFiles::File(file) => files.push(file),
            UploadedFiles::List(items) => items.iter().for_each(|item| item.collect_files(files)),
            UploadedFiles::Map(items) => items.values().for_each(|item| item.collect_files(files)),
        }
    }
}

impl Default for UploadedFiles {
    fn default() -> Self {
        UploadedFiles::Map(IndexMap::new())
    }
}

impl From<UploadedFile> for UploadedFiles {
    fn from(file: UploadedFile) -> Self {
        UploadedFiles::File(Arc::new(file))
    }
}

impl From<Arc<UploadedFile>> for UploadedFiles {
    fn from(file: Arc<UploadedFile>) -> Self {
        UploadedFiles::File(file)
    }
}

impl From<Vec<UploadedFiles>> for UploadedFiles {
    fn from(items: Vec<UploadedFiles>) -> Self {
        UploadedFiles::List(items)
    }
}

impl<K: Into<String>> FromIterator<(K, UploadedFiles)> for UploadedFiles {
    fn from_iter<T: IntoIterator<Item = (K, UploadedFiles)>>(iter: T) -> Self {
        UploadedFiles::Map(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    fn sample() -> (Stream, UploadedFile) {
        let stream = Stream::from_bytes("FooBarBaz!");
        let upload = UploadedFile::new(
            stream.clone(),
            stream.size(),
            UploadErrorCode::OK,
            Some("foo.txt".to_string()),
            Some("text/plain".to_string()),
        );
        (stream, upload)
    }

    fn scratch(name: &str) -> PathBuf {
        env::temp_dir().join(format!("micro-message-upload-{}-{name}", std::process::id()))
    }

    #[test]
    fn accessors() {
        let (stream, upload) = sample();
        assert!(upload.stream().unwrap().ptr_eq(&stream));
        assert_eq!(upload.size(), Some(10));
        assert_eq!(upload.error(), UploadErrorCode::OK);
        assert_eq!(upload.client_filename(), Some("foo.txt"));
        assert_eq!(upload.client_media_type(), Some("text/plain"));
        assert!(!upload.is_moved());
    }

    #[test]
    fn error_codes() {
        for code in 0..=8_i64 {
            assert_eq!(i64::from(UploadErrorCode::try_from(code).unwrap().value()), code);
        }
        for code in [-1_i64, 9, 255, 1000] {
            assert!(UploadErrorCode::try_from(code).unwrap_err().is_invalid_argument());
        }
        assert_eq!(UploadErrorCode::try_from(4_i64).unwrap(), UploadErrorCode::NO_FILE);
        assert_eq!(UploadErrorCode::PARTIAL.description(), "the file was only partially uploaded");
        assert!(UploadErrorCode::default().is_ok());
    }

    #[test]
    fn moving_twice_fails() {
        let (_, upload) = sample();
        let target = scratch("twice.dat");

        upload.move_to(&target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"FooBarBaz!");
        assert!(upload.is_moved());

        assert!(upload.move_to(&target).unwrap_err().is_invalid_state());
        assert!(upload.stream().unwrap_err().is_invalid_state());
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn empty_target_fails() {
        let (_, upload) = sample();
        assert!(upload.move_to("").unwrap_err().is_invalid_argument());
        assert!(!upload.is_moved());
    }

    #[test]
    fn failed_move_can_be_retried() {
        let (_, upload) = sample();
        let missing_dir = scratch("missing-dir").join("file.dat");
        assert!(matches!(upload.move_to(&missing_dir).unwrap_err(), MessageError::Io { .. }));
        assert!(!upload.is_moved());

        let target = scratch("retry.dat");
        upload.move_to(&target).unwrap();
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn temp_path_is_renamed() {
        let temp = scratch("php-tmp");
        fs::write(&temp, b"uploaded").unwrap();
        let upload = UploadedFile::from_temp_path(&temp, Some(8), UploadErrorCode::OK, None, None);

        assert_eq!(&upload.stream().unwrap().contents().unwrap()[..], b"uploaded");

        let target = scratch("renamed.dat");
        upload.move_to(&target).unwrap();
        assert!(!temp.exists());
        assert_eq!(fs::read(&target).unwrap(), b"uploaded");
        assert!(upload.stream().unwrap_err().is_invalid_state());
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn copy_fallback_moves_content() {
        let from = scratch("copy-from");
        let to = scratch("copy-to");
        fs::write(&from, b"copied").unwrap();

        copy_and_remove(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"copied");
        fs::remove_file(&to).unwrap();
    }

    #[test]
    fn failed_temp_path_move_keeps_the_file() {
        let temp = scratch("php-tmp-kept");
        fs::write(&temp, b"kept").unwrap();
        let upload = UploadedFile::from_temp_path(&temp, Some(4), UploadErrorCode::OK, None, None);

        let unreachable = scratch("missing-dir-2").join("file.dat");
        assert!(matches!(upload.move_to(&unreachable).unwrap_err(), MessageError::Io { .. }));
        assert!(!upload.is_moved());
        assert!(temp.exists());

        let target = scratch("kept.dat");
        upload.move_to(&target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"kept");
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn missing_temp_file_has_no_stream() {
        let upload =
            UploadedFile::from_temp_path(scratch("never-written"), None, UploadErrorCode::NO_FILE, None, None);
        assert!(upload.stream().unwrap_err().is_invalid_state());
    }

    #[test]
    fn tree_walking() {
        let (_, first) = sample();
        let (_, second) = sample();
        let (_, third) = sample();

        let tree: UploadedFiles = [
            ("avatar", UploadedFiles::from(first)),
            ("docs", UploadedFiles::from(vec![UploadedFiles::from(second), UploadedFiles::from(third)])),
        ]
        .into_iter()
        .collect();

        assert_eq!(tree.len(), 3);
        assert!(tree.get("avatar").unwrap().as_file().is_some());
        assert!(tree.get("docs").unwrap().get("1").unwrap().as_file().is_some());
        assert!(tree.get("docs").unwrap().get("2").is_none());
        assert!(tree.get("missing").is_none());
        assert_eq!(tree.iter_files().count(), 3);

        assert!(UploadedFiles::default().is_empty());
    }
}
