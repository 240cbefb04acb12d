//! Streaming request body reader.
//!
//! The body reader is a pull interface: [`BodyReader::read`] returns a chunk of decoded
//! payload and a [`ReadStatus`], never invoking a callback. It is fed raw socket bytes by the
//! connection driver through [`BodyReader::feed`] and, in turn, hands decoded bytes back to
//! handlers through [`BodyReader::read`].
use std::io;

use crate::error::Error;
use crate::h1::chunked::ChunkedDecoder;

/// Outcome of a single [`BodyReader::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// More data may still arrive; call `read` again (after feeding more socket bytes).
    More,
    /// The body has been fully consumed.
    End,
}

/// Selects how the body is framed on the wire.
#[derive(Debug, Clone)]
enum Mode {
    /// Exactly `remaining` more bytes are the body, taken verbatim from the socket.
    Fixed { remaining: u64 },
    /// `Transfer-Encoding: chunked`; delegates framing to [`ChunkedDecoder`].
    Chunked(ChunkedDecoder),
}

/// Streams a request body out of the connection's read buffer.
///
/// `BodyReader` does not own a socket; the connection driver calls [`feed`](BodyReader::feed)
/// with newly read bytes, and the reader decodes as much as it can into an internal queue that
/// [`read`](BodyReader::read) then drains. Bytes handed back by `read` are copied out of the
/// connection's read buffer (not borrowed), since that buffer is reused for the next socket
/// read as soon as the handler yields control back to the driver.
#[derive(Debug)]
pub struct BodyReader {
    mode: Mode,
    queue: Vec<u8>,
    exhausted: bool,
}

impl BodyReader {
    /// A body reader for a request with no body at all (e.g. `Content-Length: 0`, or absent).
    pub fn empty() -> Self {
        Self { mode: Mode::Fixed { remaining: 0 }, queue: Vec::new(), exhausted: true }
    }

    pub fn fixed(len: u64) -> Self {
        Self { mode: Mode::Fixed { remaining: len }, queue: Vec::new(), exhausted: len == 0 }
    }

    pub fn chunked(max_chunk_size: u64) -> Self {
        Self { mode: Mode::Chunked(ChunkedDecoder::new(max_chunk_size)), queue: Vec::new(), exhausted: false }
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Bytes currently queued, awaiting a [`read`](BodyReader::read) call.
    #[inline]
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Feeds raw bytes from the connection's read buffer. Returns how many of `buf`'s bytes
    /// were consumed as body framing/payload; the caller advances its buffer cursor by that
    /// amount (bytes beyond it belong to the next pipelined request or simply haven't arrived).
    pub fn feed(&mut self, buf: &[u8]) -> Result<usize, Error> {
        if self.exhausted {
            return Ok(0);
        }
        match &mut self.mode {
            Mode::Fixed { remaining } => {
                let take = (*remaining).min(buf.len() as u64) as usize;
                self.queue.extend_from_slice(&buf[..take]);
                *remaining -= take as u64;
                if *remaining == 0 {
                    self.exhausted = true;
                }
                Ok(take)
            }
            Mode::Chunked(decoder) => {
                let report = decoder.decode(buf, &mut self.queue)?;
                if report.done {
                    self.exhausted = true;
                }
                Ok(report.consumed)
            }
        }
    }

    /// Pops whatever decoded bytes are currently queued. An empty slice with `ReadStatus::More`
    /// means the caller must feed more socket bytes before calling again.
    pub fn read(&mut self) -> (Vec<u8>, ReadStatus) {
        let chunk = std::mem::take(&mut self.queue);
        let status = if self.exhausted && chunk.is_empty() { ReadStatus::End } else { ReadStatus::More };
        (chunk, status)
    }

    /// How many more bytes are definitely still to come, if known (fixed-length bodies only).
    pub fn remaining_hint(&self) -> Option<u64> {
        match self.mode {
            Mode::Fixed { remaining } => Some(remaining),
            Mode::Chunked(_) => None,
        }
    }
}

/// Reads the entire body into `scratch`, growing it but never shrinking it across requests.
///
/// `feed_more` is called whenever the reader needs additional socket bytes; it should read
/// from the connection and call [`BodyReader::feed`], returning `Ok(false)` on EOF.
pub fn body_to_bytes<F>(reader: &mut BodyReader, scratch: &mut Vec<u8>, mut feed_more: F) -> Result<(), Error>
where
    F: FnMut(&mut BodyReader) -> Result<bool, Error>,
{
    scratch.clear();
    loop {
        let (chunk, status) = reader.read();
        scratch.extend_from_slice(&chunk);
        if status == ReadStatus::End {
            return Ok(());
        }
        if !feed_more(reader)? {
            return Ok(());
        }
    }
}

/// Reads and discards the remainder of the body. Used by the connection driver when a handler
/// returns without consuming the request body fully.
pub fn drain<F>(reader: &mut BodyReader, mut feed_more: F) -> Result<(), Error>
where
    F: FnMut(&mut BodyReader) -> Result<bool, Error>,
{
    loop {
        let (_, status) = reader.read();
        if status == ReadStatus::End {
            return Ok(());
        }
        if !feed_more(reader)? {
            return Ok(());
        }
    }
}

/// Adapts [`BodyReader`] to the synchronous [`io::Read`] interface some libraries expect.
///
/// Calling [`io::Read::read`] on this adapter never itself performs socket I/O — it only drains
/// bytes already fed into the underlying [`BodyReader`]; callers still drive the connection's
/// read loop separately. This is intended for already-buffered bodies (after [`body_to_bytes`]).
pub struct IoReader<'a> {
    data: &'a [u8],
}

impl<'a> IoReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl io::Read for IoReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.data.len().min(buf.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_body_reads_exact_length() {
        let mut reader = BodyReader::fixed(5);
        let consumed = reader.feed(b"hello world").unwrap();
        assert_eq!(consumed, 5);
        let (chunk, status) = reader.read();
        assert_eq!(chunk, b"hello");
        assert_eq!(status, ReadStatus::End);
    }

    #[test]
    fn empty_body_is_immediately_exhausted() {
        let mut reader = BodyReader::empty();
        let (chunk, status) = reader.read();
        assert!(chunk.is_empty());
        assert_eq!(status, ReadStatus::End);
    }

    #[test]
    fn chunked_body_reads_decoded_payload() {
        let mut reader = BodyReader::chunked(u64::MAX);
        let consumed = reader.feed(b"5\r\nhello\r\n0\r\n\r\n").unwrap();
        assert_eq!(consumed, b"5\r\nhello\r\n0\r\n\r\n".len());
        let (chunk, status) = reader.read();
        assert_eq!(chunk, b"hello");
        assert_eq!(status, ReadStatus::End);
    }

    #[test]
    fn drain_consumes_without_exposing_bytes() {
        let mut reader = BodyReader::fixed(3);
        reader.feed(b"abc").unwrap();
        drain(&mut reader, |_| Ok(false)).unwrap();
        assert!(reader.is_exhausted());
    }
}
