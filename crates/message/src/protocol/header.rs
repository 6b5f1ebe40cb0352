//! Header storage with case-insensitive lookup and case-preserving names.
//!
//! [`Headers`] keeps one entry per lowercased field name, in insertion order.
//! Each entry remembers the name as it was last written by a caller, which is
//! the name reported by [`Headers::iter`] and put on the wire.

use http::{HeaderName, HeaderValue};
use indexmap::IndexMap;

use super::MessageError;
use crate::ensure;

/// The value(s) given for one header field.
///
/// Lets `with_header` take a single string or a list without overloads:
///
/// ```
/// use micro_message::protocol::HeaderValues;
///
/// assert_eq!(HeaderValues::from("a").into_vec(), vec!["a"]);
/// assert_eq!(HeaderValues::from(["a", "b"]).into_vec(), vec!["a", "b"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

impl HeaderValues {
    /// The values as a list, one element for a single value.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            HeaderValues::One(value) => vec![value],
            HeaderValues::Many(values) => values,
        }
    }
}

impl From<&str> for HeaderValues {
    fn from(value: &str) -> Self {
        HeaderValues::One(value.to_string())
    }
}

impl From<String> for HeaderValues {
    fn from(value: String) -> Self {
        HeaderValues::One(value)
    }
}

impl From<&String> for HeaderValues {
    fn from(value: &String) -> Self {
        HeaderValues::One(value.clone())
    }
}

impl From<Vec<String>> for HeaderValues {
    fn from(values: Vec<String>) -> Self {
        HeaderValues::Many(values)
    }
}

impl From<Vec<&str>> for HeaderValues {
    fn from(values: Vec<&str>) -> Self {
        HeaderValues::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for HeaderValues {
    fn from(values: &[&str]) -> Self {
        HeaderValues::Many(values.iter().map(|v| (*v).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderValues {
    fn from(values: [&str; N]) -> Self {
        HeaderValues::Many(values.iter().map(|v| (*v).to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// An ordered header collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, HeaderEntry>,
}

impl Headers {
    /// An empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no header is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive presence check.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// The values stored under `name`, empty when absent.
    pub fn get(&self, name: &str) -> &[String] {
        self.entries.get(&name.to_ascii_lowercase()).map_or(&[], |entry| entry.values.as_slice())
    }

    /// The values stored under `name` joined with `,`, empty when absent.
    pub fn get_line(&self, name: &str) -> String {
        self.get(name).join(",")
    }

    /// Iterates over `(name, values)` in insertion order, with each name in the
    /// casing it was last set with.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.values().map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Replaces every value of `name`, keeping the header's position if present.
    pub(crate) fn set(&mut self, name: &str, values: Vec<String>) {
        self.entries.insert(name.to_ascii_lowercase(), HeaderEntry { name: name.to_string(), values });
    }

    /// Appends to the values of `name`, creating the header if needed.
    pub(crate) fn append(&mut self, name: &str, values: Vec<String>) {
        let entry = self
            .entries
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| HeaderEntry { name: name.to_string(), values: Vec::with_capacity(values.len()) });
        name.clone_into(&mut entry.name);
        entry.values.extend(values);
    }

    /// Returns true when a header was removed.
    pub(crate) fn remove(&mut self, name: &str) -> bool {
        self.entries.shift_remove(&name.to_ascii_lowercase()).is_some()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a [String]);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a [String])> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Checks a header name and its values against the RFC 7230 field grammar.
pub(crate) fn validate(name: &str, values: &[String]) -> Result<(), MessageError> {
    if name.is_empty() {
        return Err(MessageError::invalid_header("the header name must not be empty"));
    }

    ensure!(!values.is_empty(), MessageError::invalid_header(format!("header {name} needs at least one value")));

    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| MessageError::invalid_header(format!("{name:?} is not a valid header name: {e}")))?;

    for value in values {
        HeaderValue::from_str(value).map_err(|e| {
            MessageError::invalid_header(format!("{value:?} is not a valid value for header {name}: {e}"))
        })?;
    }
    Ok(())
}
