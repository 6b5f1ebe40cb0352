//! Deserialized request bodies.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::MessageError;

/// A request body after deserialization.
///
/// Form and JSON bodies end up as [`ParsedBody::Map`] (or [`ParsedBody::List`]
/// for a top-level JSON array); [`ParsedBody::Record`] carries any typed value
/// an application deserialized itself.
#[derive(Clone)]
pub enum ParsedBody {
    Map(Map<String, Value>),
    List(Vec<Value>),
    Record(Arc<dyn Any + Send + Sync>),
}

impl ParsedBody {
    /// Wraps an application type.
    pub fn record<T: Any + Send + Sync>(value: T) -> Self {
        ParsedBody::Record(Arc::new(value))
    }

    /// Converts a JSON value: `null` is no body, objects and arrays are kept.
    ///
    /// # Errors
    ///
    /// Scalars fail with [`MessageError::InvalidArgument`].
    pub fn from_value(value: Value) -> Result<Option<Self>, MessageError> {
        match value {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(ParsedBody::Map(map))),
            Value::Array(list) => Ok(Some(ParsedBody::List(list))),
            other => Err(MessageError::invalid_argument(format!(
                "parsed body data must be an object, an array or null, {} given",
                value_kind(&other)
            ))),
        }
    }

    /// Decodes an `application/x-www-form-urlencoded` body into string values.
    /// A repeated key keeps its last value.
    pub fn from_form(body: &[u8]) -> Result<Self, MessageError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| MessageError::invalid_argument(format!("malformed form body: {e}")))?;

        Ok(ParsedBody::Map(pairs.into_iter().map(|(key, value)| (key, Value::String(value))).collect()))
    }

    /// Decodes an `application/json` body holding an object or array.
    pub fn from_json(body: &[u8]) -> Result<Option<Self>, MessageError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| MessageError::invalid_argument(format!("malformed json body: {e}")))?;
        Self::from_value(value)
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            ParsedBody::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            ParsedBody::List(list) => Some(list),
            _ => None,
        }
    }

    /// The record as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            ParsedBody::Record(record) => record.downcast_ref(),
            _ => None,
        }
    }

    /// A field of a map body.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl fmt::Debug for ParsedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedBody::Map(map) => f.debug_tuple("Map").field(map).finish(),
            ParsedBody::List(list) => f.debug_tuple("List").field(list).finish(),
            ParsedBody::Record(_) => f.write_str("Record(..)"),
        }
    }
}

/// The JSON type name of a value, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
