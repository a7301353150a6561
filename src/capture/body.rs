//! Body capture for logging.

/// Content-type fragments that mark a response body as text.
const TEXT_CONTENT_TYPES: [&str; 4] = ["json", "text", "xml", "javascript"];

/// Capture a request body. Any valid UTF-8 under the limit is kept as text.
pub fn capture_request_body(body: &[u8], limit: usize) -> String {
    if body.len() >= limit {
        return too_large(body.len());
    }
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => format!("[Binary data: {} bytes]", body.len()),
    }
}

/// Capture a response body. Only text-like content types are decoded.
pub fn capture_response_body(body: &[u8], content_type: Option<&str>, limit: usize) -> String {
    if body.len() >= limit {
        return too_large(body.len());
    }

    let content_type = content_type.unwrap_or("");
    if !TEXT_CONTENT_TYPES.iter().any(|t| content_type.contains(t)) {
        return format!("[Binary data: {} bytes]", body.len());
    }

    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => format!("[Error decoding: {} bytes]", body.len()),
    }
}

fn too_large(len: usize) -> String {
    format!("[Body too large: {} bytes]", len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_text_kept() {
        assert_eq!(capture_request_body(b"{\"a\":1}", 100), "{\"a\":1}");
        assert_eq!(capture_request_body(b"", 100), "");
    }

    #[test]
    fn test_request_invalid_utf8() {
        assert_eq!(
            capture_request_body(&[0xff, 0xfe, 0x00], 100),
            "[Binary data: 3 bytes]"
        );
    }

    #[test]
    fn test_limit_is_exclusive() {
        let body = vec![b'a'; 10];
        assert_eq!(capture_request_body(&body, 10), "[Body too large: 10 bytes]");
        assert_eq!(capture_request_body(&body, 11), "aaaaaaaaaa");
        assert_eq!(
            capture_response_body(&body, Some("text/plain"), 10),
            "[Body too large: 10 bytes]"
        );
    }

    #[test]
    fn test_response_text_like_types() {
        for ct in [
            "application/json",
            "text/html; charset=utf-8",
            "application/xml",
            "application/javascript",
        ] {
            assert_eq!(capture_response_body(b"hello", Some(ct), 100), "hello");
        }
    }

    #[test]
    fn test_response_binary_types() {
        assert_eq!(
            capture_response_body(b"\x89PNG", Some("image/png"), 100),
            "[Binary data: 4 bytes]"
        );
        assert_eq!(
            capture_response_body(b"abc", None, 100),
            "[Binary data: 3 bytes]"
        );
    }

    #[test]
    fn test_response_decode_failure() {
        assert_eq!(
            capture_response_body(&[0xc3, 0x28], Some("text/plain"), 100),
            "[Error decoding: 2 bytes]"
        );
    }
}
