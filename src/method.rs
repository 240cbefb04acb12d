//! HTTP request method.
use std::fmt;
use std::str::FromStr;

/// HTTP Method.
///
/// Only the methods enumerated in [RFC 7231 section 4](https://tools.ietf.org/html/rfc7231#section-4)
/// are recognized; any other token fails request-line parsing with a `NotImplemented` error
/// rather than being stored on the [`Request`](crate::request::Request).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Method(Inner);

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
enum Inner {
    Options,
    #[default]
    Get,
    Head,
    Trace,
    Connect,
    Post,
    Put,
    Delete,
    Patch,
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        str::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Method {
    forward! {
        pub const OPTIONS: Options = b"OPTIONS";
        pub const GET: Get = b"GET";
        pub const HEAD: Head = b"HEAD";
        pub const TRACE: Trace = b"TRACE";
        pub const CONNECT: Connect = b"CONNECT";
        pub const POST: Post = b"POST";
        pub const PUT: Put = b"PUT";
        pub const DELETE: Delete = b"DELETE";
        pub const PATCH: Patch = b"PATCH";
    }

    /// All known methods, in the order they're checked. Used to build `Allow` headers and the
    /// server-wide `OPTIONS *` response.
    pub const ALL: [Method; 9] = [
        Self::OPTIONS,
        Self::GET,
        Self::HEAD,
        Self::TRACE,
        Self::CONNECT,
        Self::POST,
        Self::PUT,
        Self::DELETE,
        Self::PATCH,
    ];
}

/// An error when trying to parse [`Method`] from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown method")]
pub struct UnknownMethod;

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes()).ok_or(UnknownMethod)
    }
}

macro_rules! forward {
    ($($(#[$doc:meta])* pub const $name:ident: $variant:ident = $val:literal;)*) => {
        $(
            $(#[$doc])*
            pub const $name: Method = Method(Inner::$variant);
        )*

        /// Matches a method token exactly (case-sensitive, per RFC 7230).
        pub const fn from_bytes(src: &[u8]) -> Option<Method> {
            match src {
                $(
                    $val => Some(Self::$name),
                )*
                _ => None,
            }
        }

        pub const fn as_str(&self) -> &'static str {
            match self.0 {
                $(
                    Inner::$variant => stringify!($name),
                )*
            }
        }
    };
}

use forward;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_methods_round_trip() {
        for m in Method::ALL {
            assert_eq!(Method::from_bytes(m.as_str().as_bytes()), Some(m));
        }
    }

    #[test]
    fn unknown_method_rejected() {
        assert_eq!(Method::from_bytes(b"FROB"), None);
    }
}
