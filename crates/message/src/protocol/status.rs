//! Status code validation and default reason phrases.

/// Returns true for any three digit code from `100` to `599`.
#[inline]
pub fn is_valid_status_code(code: u16) -> bool {
    (100..=599).contains(&code)
}

/// The default reason phrase for a status code, or `""` if the code isn't listed.
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        102 => "Processing",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        306 | 418..=421 | 508 | 509 => "unused",
        307 => "Temporary Redirect",
        400 => "Bad Request",
        401 => "Authorization Required",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Time-out",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Large",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "No code",
        426 => "Upgrade Required",
        500 => "Internal Server Error",
        501 => "Method Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Temporarily Unavailable",
        504 => "Gateway Time-out",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        510 => "Not Extended",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_size() {
        let listed = (0..=u16::MAX).filter(|code| !reason_phrase(*code).is_empty()).count();
        assert_eq!(listed, 56);
    }

    #[test]
    fn listed_only_when_valid() {
        assert!((0..=u16::MAX).filter(|code| !reason_phrase(*code).is_empty()).all(is_valid_status_code));
    }

    #[test]
    fn validity() {
        for code in [100, 199, 200, 475, 599] {
            assert!(is_valid_status_code(code), "{code}");
        }
        for code in [0, 12, 99, 600, 1000] {
            assert!(!is_valid_status_code(code), "{code}");
        }
    }
}
