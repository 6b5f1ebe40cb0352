//! Normalizes gateway upload descriptions into an [`UploadedFiles`] tree.
//!
//! Gateways report uploads in two shapes. A single file field is one descriptor
//! of scalars; a multi-file field (`docs[]`, `docs[a][b]`) is one descriptor
//! whose five keys each hold a parallel array or object. Both end up as the
//! same tree: one [`UploadedFiles::File`] per file, nested like the field names.

use indexmap::IndexMap;
use micro_message::protocol::{value_kind, MessageError, UploadErrorCode, UploadedFile, UploadedFiles};
use serde::Deserialize;
use serde_json::{Map, Value};

static NULL: Value = Value::Null;

const TMP_NAME: &str = "tmp_name";
const DESCRIPTOR_KEYS: [&str; 5] = [TMP_NAME, "size", "error", "name", "type"];

/// One file as reported by the gateway.
#[derive(Debug, Deserialize)]
struct FileDescriptor {
    tmp_name: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    error: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    media_type: Option<String>,
}

impl FileDescriptor {
    fn into_file(self) -> Result<UploadedFile, MessageError> {
        let error = UploadErrorCode::try_from(self.error)?;
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        Ok(UploadedFile::from_temp_path(self.tmp_name, self.size, error, non_empty(self.name), non_empty(self.media_type)))
    }
}

/// Builds the upload tree. `null` means no uploads.
///
/// # Errors
///
/// [`MessageError::TypeMismatch`] when something other than a descriptor sits
/// where a file is expected, [`MessageError::InvalidArgument`] for a malformed
/// descriptor or an unknown error code.
pub fn normalize_files(files: &Value) -> Result<UploadedFiles, MessageError> {
    match files {
        Value::Null => Ok(UploadedFiles::default()),
        other => normalize(other),
    }
}

fn normalize(value: &Value) -> Result<UploadedFiles, MessageError> {
    match value {
        Value::Object(descriptor) if descriptor.contains_key(TMP_NAME) => spread(descriptor),
        Value::Object(fields) => {
            let files = fields
                .iter()
                .map(|(field, value)| normalize(value).map(|files| (field.clone(), files)))
                .collect::<Result<IndexMap<_, _>, _>>()?;
            Ok(UploadedFiles::Map(files))
        }
        Value::Array(items) => Ok(UploadedFiles::List(items.iter().map(normalize).collect::<Result<_, _>>()?)),
        other => Err(MessageError::type_mismatch("uploaded file descriptor", value_kind(other))),
    }
}

/// Walks the `tmp_name` entry of a descriptor and picks the matching entry from
/// every other key, so parallel arrays turn into one descriptor per file.
fn spread(descriptor: &Map<String, Value>) -> Result<UploadedFiles, MessageError> {
    let fields: [&Value; 5] = DESCRIPTOR_KEYS.map(|key| descriptor.get(key).unwrap_or(&NULL));
    spread_fields(fields)
}

fn spread_fields(fields: [&Value; 5]) -> Result<UploadedFiles, MessageError> {
    match fields[0] {
        Value::Array(items) => {
            let files = (0..items.len())
                .map(|index| spread_fields(fields.map(|field| field.get(index).unwrap_or(&NULL))))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(UploadedFiles::List(files))
        }
        Value::Object(items) => {
            let files = items
                .keys()
                .map(|key| {
                    spread_fields(fields.map(|field| field.get(key).unwrap_or(&NULL))).map(|files| (key.clone(), files))
                })
                .collect::<Result<IndexMap<_, _>, _>>()?;
            Ok(UploadedFiles::Map(files))
        }
        _ => leaf(fields),
    }
}

fn leaf(fields: [&Value; 5]) -> Result<UploadedFiles, MessageError> {
    let descriptor: Map<String, Value> = DESCRIPTOR_KEYS
        .iter()
        .zip(fields)
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect();

    let descriptor: FileDescriptor = serde_json::from_value(Value::Object(descriptor))
        .map_err(|e| MessageError::invalid_argument(format!("malformed upload descriptor: {e}")))?;
    Ok(UploadedFiles::from(descriptor.into_file()?))
}
