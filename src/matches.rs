//! Const ASCII byte classification tables, used by the wire-format parsers.

macro_rules! byte_map {
    {
        $(#[$meta:meta])*
        $vis:vis const fn $fn_id:ident($byte:ident:$u8:ty) { $e:expr }
    } => {
        $(#[$meta])*
        $vis const fn $fn_id($byte: $u8) -> bool {
            static PAT: [bool; 256] = {
                let mut bytes = [false; 256];
                let mut $byte = 0u8;
                const fn filter($byte: $u8) -> bool {
                    $e
                }
                loop {
                    bytes[$byte as usize] = filter($byte);
                    if $byte == 255 {
                        break;
                    }
                    $byte += 1;
                }
                bytes
            };
            // SAFETY: the pattern covers the full u8 range
            unsafe { *PAT.as_ptr().add($byte as usize) }
        }
    };
}

use byte_map;

byte_map! {
    /// token = 1*tchar, tchar per RFC 7230 section 3.2.6.
    ///
    /// Used for both the request method and header field names.
    #[inline(always)]
    pub const fn is_token(byte: u8) {
        matches!(
            byte,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*'
            | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
        || byte.is_ascii_alphanumeric()
    }
}

byte_map! {
    /// method = token, but the parser additionally rejects tokens not in the known set,
    /// so this only filters out bytes that can never appear in any method.
    #[inline(always)]
    pub const fn is_method(byte: u8) {
        is_token(byte)
    }
}

byte_map! {
    /// field-vchar = VCHAR / obs-text, i.e. any visible ASCII or byte >= 0x80.
    #[inline(always)]
    pub const fn is_header_value(byte: u8) {
        matches!(byte, 0x21..=0x7e) || byte >= 0x80 || byte == b' ' || byte == b'\t'
    }
}

byte_map! {
    /// OWS = *( SP / HTAB )
    #[inline(always)]
    pub const fn is_ows(byte: u8) {
        matches!(byte, b' ' | b'\t')
    }
}
