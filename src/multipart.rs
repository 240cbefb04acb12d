//! `multipart/form-data` body parsing ([RFC 7578]).
//!
//! [RFC 7578]: <https://www.rfc-editor.org/rfc/rfc7578>
//!
//! Only `name`/value field extraction is supported — file-upload parts (those carrying a
//! `filename` parameter) are surfaced with their raw bytes but no separate streaming-to-disk
//! path; the whole body must already be buffered before calling [`parse`].

use crate::error::{Error, ErrorKind};

/// One part of a multipart body.
#[derive(Debug, Clone)]
pub struct Part<'a> {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

/// Extracts the `boundary` parameter from a `Content-Type: multipart/form-data; boundary=...`
/// header value. Returns `None` if the media type isn't multipart or carries no boundary.
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    let lower = content_type.to_ascii_lowercase();
    if !lower.starts_with("multipart/") {
        return None;
    }
    for param in content_type.split(';').skip(1) {
        let param = param.trim();
        if let Some(rest) = param.strip_prefix("boundary=") {
            return Some(rest.trim_matches('"'));
        }
    }
    None
}

/// Splits `body` into its constituent parts using `boundary` (without the leading `--`).
pub fn parse<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<Part<'a>>, Error> {
    let delim = format!("--{boundary}");
    let delim = delim.as_bytes();

    let mut parts = Vec::new();
    let mut cursor = find(body, delim, 0)
        .ok_or_else(|| Error::new(ErrorKind::BadRequest, "multipart boundary not found"))?
        + delim.len();

    loop {
        if body[cursor..].starts_with(b"--") {
            break;
        }
        cursor = skip_crlf(body, cursor);

        let header_end = find(body, b"\r\n\r\n", cursor)
            .ok_or_else(|| Error::new(ErrorKind::BadRequest, "multipart part missing header terminator"))?;
        let header_block = std::str::from_utf8(&body[cursor..header_end])
            .map_err(|_| Error::new(ErrorKind::BadRequest, "multipart headers are not valid utf-8"))?;
        let data_start = header_end + 4;

        let next_delim = find(body, delim, data_start)
            .ok_or_else(|| Error::new(ErrorKind::BadRequest, "multipart part not terminated"))?;
        // the two bytes before the next boundary are the part's trailing CRLF, not payload.
        let data_end = next_delim.saturating_sub(2).max(data_start);
        let data = &body[data_start..data_end];

        let (name, filename, content_type) = parse_part_headers(header_block)?;
        parts.push(Part { name, filename, content_type, data });

        cursor = next_delim + delim.len();
    }

    Ok(parts)
}

fn parse_part_headers(block: &str) -> Result<(String, Option<String>, Option<&str>), Error> {
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in block.split("\r\n") {
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else { continue };
        if key.trim().eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').skip(1) {
                let param = param.trim();
                if let Some(rest) = param.strip_prefix("name=") {
                    name = Some(rest.trim_matches('"').to_string());
                } else if let Some(rest) = param.strip_prefix("filename=") {
                    filename = Some(rest.trim_matches('"').to_string());
                }
            }
        } else if key.trim().eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim());
        }
    }

    let name = name.ok_or_else(|| Error::new(ErrorKind::BadRequest, "multipart part missing name"))?;
    Ok((name, filename, content_type))
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack[from..].windows(needle.len()).position(|w| w == needle).map(|i| i + from)
}

fn skip_crlf(buf: &[u8], at: usize) -> usize {
    if buf[at..].starts_with(b"\r\n") { at + 2 } else { at }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_boundary_from_content_type() {
        let ct = "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxk";
        assert_eq!(extract_boundary(ct), Some("----WebKitFormBoundary7MA4YWxk"));
    }

    #[test]
    fn non_multipart_has_no_boundary() {
        assert_eq!(extract_boundary("application/json"), None);
    }

    #[test]
    fn parses_single_text_field() {
        let body = b"--BOUND\r\n\
Content-Disposition: form-data; name=\"field1\"\r\n\
\r\n\
value1\r\n\
--BOUND--\r\n";
        let parts = parse(body, "BOUND").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "field1");
        assert_eq!(parts[0].data, b"value1");
        assert!(parts[0].filename.is_none());
    }

    #[test]
    fn parses_multiple_parts_including_file() {
        let body = b"--BOUND\r\n\
Content-Disposition: form-data; name=\"field1\"\r\n\
\r\n\
value1\r\n\
--BOUND\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
hello\r\n\
--BOUND--\r\n";
        let parts = parse(body, "BOUND").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].filename.as_deref(), Some("a.txt"));
        assert_eq!(parts[1].content_type, Some("text/plain"));
        assert_eq!(parts[1].data, b"hello");
    }

    #[test]
    fn missing_boundary_is_bad_request() {
        let err = parse(b"no boundary here", "BOUND").unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
    }
}
