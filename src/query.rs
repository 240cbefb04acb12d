//! Query string and `application/x-www-form-urlencoded` body parsing.
//!
//! Both wire formats share the same `key=value&key=value` grammar, differing only in whether
//! `+` is folded to a space (form bodies do this; query strings, per the URI grammar, do not).

use crate::kv::KvList;
use crate::percent;

/// Parses a raw query string (the bytes after `?`, without percent-decoding applied yet) into
/// an ordered multimap. `+` is left as a literal plus, matching RFC 3986's query component.
pub fn parse_query(raw: &[u8]) -> KvList {
    parse_pairs(raw, false)
}

/// Parses an `application/x-www-form-urlencoded` body. `+` decodes to a space.
pub fn parse_form(raw: &[u8]) -> KvList {
    parse_pairs(raw, true)
}

fn parse_pairs(raw: &[u8], plus_as_space: bool) -> KvList {
    let mut kv = KvList::new();
    if raw.is_empty() {
        return kv;
    }
    for segment in raw.split(|&b| b == b'&') {
        if segment.is_empty() {
            continue;
        }
        let (key_raw, val_raw) = match segment.iter().position(|&b| b == b'=') {
            Some(idx) => (&segment[..idx], &segment[idx + 1..]),
            None => (segment, &segment[segment.len()..]),
        };
        let key = decode_component(key_raw, plus_as_space);
        let val = decode_component(val_raw, plus_as_space);
        kv.append(key, val);
    }
    kv
}

/// Decodes one `key` or `value` span. Invalid `%` escapes are not treated as fatal here (unlike
/// the request-line target) — malformed query/form data degrades to literal bytes instead of
/// failing the whole request, matching how browsers and most HTTP frameworks tolerate it.
fn decode_component(raw: &[u8], plus_as_space: bool) -> String {
    let owned;
    let bytes = if plus_as_space && raw.contains(&b'+') {
        owned = raw.iter().map(|&b| if b == b'+' { b' ' } else { b }).collect::<Vec<u8>>();
        owned.as_slice()
    } else {
        raw
    };
    match percent::decode(bytes) {
        Ok(decoded) => String::from_utf8_lossy(&decoded).into_owned(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_pairs() {
        let kv = parse_query(b"a=1&b=2");
        assert_eq!(kv.get("a"), Some("1"));
        assert_eq!(kv.get("b"), Some("2"));
    }

    #[test]
    fn query_keeps_literal_plus() {
        let kv = parse_query(b"q=a+b");
        assert_eq!(kv.get("q"), Some("a+b"));
    }

    #[test]
    fn form_decodes_plus_as_space() {
        let kv = parse_form(b"q=a+b");
        assert_eq!(kv.get("q"), Some("a b"));
    }

    #[test]
    fn percent_escapes_are_decoded_in_both() {
        let kv = parse_query(b"name=John%20Doe");
        assert_eq!(kv.get("name"), Some("John Doe"));
    }

    #[test]
    fn key_without_equals_has_empty_value() {
        let kv = parse_query(b"flag");
        assert_eq!(kv.get("flag"), Some(""));
    }

    #[test]
    fn empty_segments_are_skipped() {
        let kv = parse_query(b"a=1&&b=2");
        assert_eq!(kv.len(), 2);
    }
}
