//! HTTP status codes and their standard reason phrases.

/// An HTTP status code, 100..=599.
///
/// Unlike [`Method`](crate::method::Method) or [`Version`](crate::version::Version), status
/// codes are not a closed set — a response builder may set any three-digit code, and the
/// [`reason`](StatusCode::reason) falls back to `"Unknown Status"` for codes this crate does
/// not recognize rather than rejecting them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

macro_rules! status_codes {
    ($($(#[$doc:meta])* $int:literal $id:ident $msg:literal;)*) => {
        impl StatusCode {
            $(
                $(#[$doc])*
                pub const $id: Self = Self($int);
            )*

            /// Returns the standard reason phrase for well-known codes, else a generic phrase.
            pub const fn reason(&self) -> &'static str {
                match self.0 {
                    $($int => $msg,)*
                    _ => "Unknown Status",
                }
            }
        }
    };
}

status_codes! {
    /// `100`, interim response indicating the client should continue with the request body.
    100 CONTINUE "Continue";
    /// `101`, sent in response to an `Upgrade` request header.
    101 SWITCHING_PROTOCOLS "Switching Protocols";
    200 OK "OK";
    201 CREATED "Created";
    204 NO_CONTENT "No Content";
    206 PARTIAL_CONTENT "Partial Content";
    301 MOVED_PERMANENTLY "Moved Permanently";
    302 FOUND "Found";
    303 SEE_OTHER "See Other";
    /// `304`, used for conditional/cache requests; never carries a body.
    304 NOT_MODIFIED "Not Modified";
    307 TEMPORARY_REDIRECT "Temporary Redirect";
    400 BAD_REQUEST "Bad Request";
    401 UNAUTHORIZED "Unauthorized";
    403 FORBIDDEN "Forbidden";
    404 NOT_FOUND "Not Found";
    405 METHOD_NOT_ALLOWED "Method Not Allowed";
    406 NOT_ACCEPTABLE "Not Acceptable";
    408 REQUEST_TIMEOUT "Request Timeout";
    413 PAYLOAD_TOO_LARGE "Payload Too Large";
    414 URI_TOO_LONG "URI Too Long";
    431 HEADER_FIELDS_TOO_LARGE "Request Header Fields Too Large";
    500 INTERNAL_SERVER_ERROR "Internal Server Error";
    501 NOT_IMPLEMENTED "Not Implemented";
    505 HTTP_VERSION_NOT_SUPPORTED "HTTP Version Not Supported";
}

impl Default for StatusCode {
    #[inline]
    fn default() -> Self {
        Self::OK
    }
}

impl StatusCode {
    /// Constructs an arbitrary status code without validating the range.
    #[inline]
    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_informational(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }
}

impl std::fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_has_standard_reason() {
        assert_eq!(StatusCode::NOT_FOUND.reason(), "Not Found");
    }

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(StatusCode::from_u16(599).reason(), "Unknown Status");
    }
}
