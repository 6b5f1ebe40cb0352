//! Splits a URI reference into its raw components.
//!
//! This follows the generic decomposition of RFC 3986 appendix B:
//!
//! ```text
//! ^(([^:/?#]+):)?(//([^/?#]*))?([^?#]*)(\?([^#]*))?(#(.*))?
//! ```
//!
//! Nothing is decoded or encoded here; the caller filters each piece.

use crate::ensure;
use crate::protocol::MessageError;

/// Borrowed pieces of a URI string, exactly as they appeared.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawParts<'a> {
    pub(crate) scheme: Option<&'a str>,
    pub(crate) user_info: Option<&'a str>,
    pub(crate) host: Option<&'a str>,
    pub(crate) port: Option<u16>,
    pub(crate) path: &'a str,
    pub(crate) query: Option<&'a str>,
    pub(crate) fragment: Option<&'a str>,
}

pub(crate) fn parse(input: &str) -> Result<RawParts<'_>, MessageError> {
    let mut parts = RawParts::default();

    let (rest, fragment) = match input.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (input, None),
    };
    parts.fragment = fragment;

    let (mut rest, query) = match rest.split_once('?') {
        Some((rest, query)) => (rest, Some(query)),
        None => (rest, None),
    };
    parts.query = query;

    if let Some((scheme, remaining)) = split_scheme(rest) {
        parts.scheme = Some(scheme);
        rest = remaining;
    }

    if let Some(after_slashes) = rest.strip_prefix("//") {
        let end = after_slashes.find('/').unwrap_or(after_slashes.len());
        let (authority, path) = after_slashes.split_at(end);
        parse_authority(authority, &mut parts)?;
        rest = path;
    }

    parts.path = rest;
    Ok(parts)
}

fn split_scheme(input: &str) -> Option<(&str, &str)> {
    let colon = input.find(':')?;
    if input[..colon].contains('/') {
        return None;
    }

    let scheme = &input[..colon];
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| (scheme, &input[colon + 1..]))
}

fn parse_authority<'a>(authority: &'a str, parts: &mut RawParts<'a>) -> Result<(), MessageError> {
    let host_port = match authority.rsplit_once('@') {
        Some((user_info, host_port)) => {
            parts.user_info = Some(user_info);
            host_port
        }
        None => authority,
    };

    let (host, port) = if host_port.starts_with('[') {
        // IP-literal, the port can only follow the closing bracket
        let close = host_port
            .find(']')
            .ok_or_else(|| MessageError::invalid_argument(format!("unterminated IP literal in authority: {authority}")))?;
        let (host, after) = host_port.split_at(close + 1);
        match after {
            "" => (host, None),
            _ => {
                let port = after
                    .strip_prefix(':')
                    .ok_or_else(|| MessageError::invalid_argument(format!("invalid authority: {authority}")))?;
                (host, Some(port))
            }
        }
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    parts.host = Some(host);
    parts.port = match port {
        Some(port) if !port.is_empty() => parse_port(port)?,
        _ => None,
    };
    Ok(())
}

/// Port `0` reads as "no port"; anything non-numeric or above 65535 is rejected.
fn parse_port(port: &str) -> Result<Option<u16>, MessageError> {
    ensure!(
        port.bytes().all(|b| b.is_ascii_digit()),
        MessageError::invalid_argument(format!("the port must be numeric, {port:?} given"))
    );

    let port = port
        .parse::<u16>()
        .map_err(|e| MessageError::invalid_argument(format!("the port {port} is outside the range 1-65535: {e}")))?;
    Ok((port != 0).then_some(port))
}
