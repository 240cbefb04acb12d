//! HTTP protocol version, as carried on the request/status line.
use std::fmt;

/// HTTP Version.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Version(Inner);

#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
enum Inner {
    Http09,
    Http10,
    #[default]
    Http11,
}

impl Version {
    pub const HTTP_09: Version = Version(Inner::Http09);
    pub const HTTP_10: Version = Version(Inner::Http10);
    pub const HTTP_11: Version = Version(Inner::Http11);

    /// Matches the exact wire token, e.g. `HTTP/1.1`.
    pub const fn from_bytes(bytes: &[u8]) -> Option<Version> {
        match bytes {
            b"HTTP/0.9" => Some(Self::HTTP_09),
            b"HTTP/1.0" => Some(Self::HTTP_10),
            b"HTTP/1.1" => Some(Self::HTTP_11),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self.0 {
            Inner::Http09 => "HTTP/0.9",
            Inner::Http10 => "HTTP/1.0",
            Inner::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
