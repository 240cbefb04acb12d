//! HTTP/1.x wire format ([RFC 9112]).
//!
//! [RFC 9112]: <https://www.rfc-editor.org/rfc/rfc9112.html>
//!
//! - [`parser`] the request-line + header-block state machine
//! - [`chunked`] the chunked transfer-coding sub-state machine

pub mod chunked;
pub mod parser;

pub use parser::{RawHead, Status, parse_head};
