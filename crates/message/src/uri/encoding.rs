//! Percent-encoding for URI components.
//!
//! Bytes outside the component's allowed set are written as `%XX` (uppercase hex,
//! one escape per UTF-8 byte). A `%` that already starts a valid escape is kept
//! verbatim, so encoding an encoded component is a no-op.

use std::borrow::Cow;

const SUB_DELIMITERS: &[u8] = b"!&,;=$'*()+";

/// Which grammar a piece of a URI belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Component {
    /// One path segment; `/` never reaches the encoder.
    Segment,
    /// Query or fragment data, which may also carry `/` and `?`.
    Query,
}

impl Component {
    #[inline]
    fn allows(self, b: u8) -> bool {
        b.is_ascii_alphanumeric()
            || matches!(b, b'_' | b'~' | b'-' | b'.' | b':' | b'@')
            || SUB_DELIMITERS.contains(&b)
            || (self == Component::Query && matches!(b, b'/' | b'?'))
    }
}

#[inline]
fn is_escape(bytes: &[u8], index: usize) -> bool {
    bytes[index] == b'%'
        && bytes.get(index + 1).is_some_and(u8::is_ascii_hexdigit)
        && bytes.get(index + 2).is_some_and(u8::is_ascii_hexdigit)
}

/// Encodes `input` for `component`, borrowing when nothing needs escaping.
pub(crate) fn encode(input: &str, component: Component) -> Cow<'_, str> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let bytes = input.as_bytes();
    let keep = |i: usize| component.allows(bytes[i]) || is_escape(bytes, i);

    let Some(first) = (0..bytes.len()).find(|&i| !keep(i)) else {
        return Cow::Borrowed(input);
    };

    let mut encoded = String::with_capacity(bytes.len() + 8);
    encoded.push_str(&input[..first]);
    for (i, &b) in bytes.iter().enumerate().skip(first) {
        if keep(i) {
            encoded.push(char::from(b));
        } else {
            encoded.push('%');
            encoded.push(char::from(HEX[usize::from(b >> 4)]));
            encoded.push(char::from(HEX[usize::from(b & 0x0f)]));
        }
    }
    Cow::Owned(encoded)
}

/// Encodes every `/`-separated segment on its own.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/').map(|segment| encode(segment, Component::Segment)).collect::<Vec<_>>().join("/")
}

/// Encodes every key and value of an `&`-separated query independently.
///
/// A leading `?` is dropped. Pairs without `=` stay bare.
pub(crate) fn encode_query(query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    if query.is_empty() {
        return String::new();
    }

    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => format!("{}={}", encode(key, Component::Query), encode(value, Component::Query)),
            None => encode(pair, Component::Query).into_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) fn encode_fragment(fragment: &str) -> String {
    encode(fragment, Component::Query).into_owned()
}
