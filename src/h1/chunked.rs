//! Chunked transfer-coding sub-state machine ([RFC 9112 section 7.1]).
//!
//! [RFC 9112 section 7.1]: <https://www.rfc-editor.org/rfc/rfc9112.html#name-chunked-transfer-coding>
//!
//! ```text
//! chunk-size-hex -> size-CR -> size-LF ->
//!   (size == 0 -> last-CR -> last-LF -> done)
//!   (size >  0 -> chunk-bytes ... -> chunk-CR -> chunk-LF -> chunk-size-hex)
//! ```
//!
//! Chunk extensions (`;ext=val` after the size) are tolerated and skipped to the line's CRLF.
//! Trailing headers after the terminating chunk are scanned and discarded — never exposed to
//! the handler, per the invariant that headers are immutable once the handler has been invoked.

use crate::error::{Error, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Size,
    Data { remaining: u64 },
    TrailerLine,
    Done,
}

/// Decodes one request body framed with `Transfer-Encoding: chunked`.
///
/// Call [`ChunkedDecoder::decode`] repeatedly with the bytes currently buffered from the
/// socket; it consumes what it can and reports how many decoded bytes of chunk payload (not
/// framing) were appended to `out`, how many input bytes were consumed, and whether the
/// terminating chunk (and any trailers) has been reached.
#[derive(Debug, Clone)]
pub struct ChunkedDecoder {
    phase: Phase,
    max_chunk_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeReport {
    pub consumed: usize,
    pub produced: usize,
    pub done: bool,
}

impl ChunkedDecoder {
    pub fn new(max_chunk_size: u64) -> Self {
        Self { phase: Phase::Size, max_chunk_size }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Finds the end of a CRLF-terminated line, or `None` if not yet buffered.
    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|w| w == b"\r\n")
    }

    /// Decodes as much of `buf` as currently possible, appending payload bytes to `out`.
    pub fn decode(&mut self, buf: &[u8], out: &mut Vec<u8>) -> Result<DecodeReport, Error> {
        let mut consumed = 0usize;
        let mut produced = 0usize;

        loop {
            match self.phase {
                Phase::Done => break,
                Phase::Size => {
                    let rest = &buf[consumed..];
                    let Some(line_len) = Self::find_crlf(rest) else { break };
                    let line = &rest[..line_len];
                    let hex_len = line.iter().position(|b| !b.is_ascii_hexdigit()).unwrap_or(line.len());
                    if hex_len == 0 {
                        return Err(Error::new(ErrorKind::BadRequest, "missing chunk size"));
                    }
                    // the remainder of the line, if any, is a `;`-led extension; tolerated and
                    // discarded rather than validated.
                    if hex_len < line.len() && line[hex_len] != b';' {
                        return Err(Error::new(ErrorKind::BadRequest, "malformed chunk size line"));
                    }
                    let size_str = std::str::from_utf8(&line[..hex_len]).expect("ascii hexdigit is valid utf8");
                    let size = u64::from_str_radix(size_str, 16)
                        .map_err(|_| Error::new(ErrorKind::BadRequest, "invalid chunk size"))?;
                    if size > self.max_chunk_size {
                        return Err(Error::from(ErrorKind::BodyTooLarge));
                    }

                    consumed += line_len + 2;
                    self.phase = if size == 0 {
                        Phase::TrailerLine
                    } else {
                        Phase::Data { remaining: size }
                    };
                }
                Phase::Data { remaining } => {
                    let rest = &buf[consumed..];
                    let take = remaining.min(rest.len() as u64) as usize;
                    out.extend_from_slice(&rest[..take]);
                    produced += take;
                    consumed += take;
                    let remaining = remaining - take as u64;

                    if remaining > 0 {
                        self.phase = Phase::Data { remaining };
                        break;
                    }
                    // chunk payload fully read; expect the trailing CRLF
                    let rest = &buf[consumed..];
                    if rest.len() < 2 {
                        self.phase = Phase::Data { remaining: 0 };
                        break;
                    }
                    if &rest[..2] != b"\r\n" {
                        return Err(Error::new(ErrorKind::BadRequest, "chunk data not followed by CRLF"));
                    }
                    consumed += 2;
                    self.phase = Phase::Size;
                }
                Phase::TrailerLine => {
                    let rest = &buf[consumed..];
                    let Some(line_len) = Self::find_crlf(rest) else { break };
                    consumed += line_len + 2;
                    if line_len == 0 {
                        self.phase = Phase::Done;
                    }
                    // non-empty trailer lines are discarded, never surfaced to the handler.
                }
            }
        }

        Ok(DecodeReport { consumed, produced, done: self.phase == Phase::Done })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<u8> {
        let mut dec = ChunkedDecoder::new(u64::MAX);
        let mut out = Vec::new();
        let report = dec.decode(input, &mut out).unwrap();
        assert_eq!(report.consumed, input.len());
        assert!(report.done);
        out
    }

    #[test]
    fn spec_example_mozilla_developer_network() {
        let input = b"7\r\nMozilla\r\n1\r\n \r\n11\r\nDeveloper Network\r\n0\r\n\r\n";
        let out = decode_all(input);
        assert_eq!(out, b"Mozilla Developer Network");
    }

    #[test]
    fn partial_input_reports_remaining_need() {
        let mut dec = ChunkedDecoder::new(u64::MAX);
        let mut out = Vec::new();
        let report = dec.decode(b"5\r\nHel", &mut out).unwrap();
        assert_eq!(report.produced, 3);
        assert!(!report.done);
        let report = dec.decode(b"lo\r\n0\r\n\r\n", &mut out).unwrap();
        assert_eq!(report.produced, 2);
        assert!(report.done);
        assert_eq!(out, b"Hello");
    }

    #[test]
    fn chunk_extensions_are_skipped() {
        let out = decode_all(b"5;foo=bar\r\nHello\r\n0\r\n\r\n");
        assert_eq!(out, b"Hello");
    }

    #[test]
    fn oversized_chunk_is_rejected() {
        let mut dec = ChunkedDecoder::new(4);
        let mut out = Vec::new();
        let err = dec.decode(b"5\r\nHello\r\n0\r\n\r\n", &mut out).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BodyTooLarge);
    }

    #[test]
    fn trailers_are_discarded() {
        let out = decode_all(b"0\r\nX-Trailer: yes\r\n\r\n");
        assert!(out.is_empty());
    }
}
