//! Ordered key/value container used for headers, query strings, route params and form fields.
//!
//! Duplicate keys are retained in insertion order — required for headers such as `Set-Cookie`
//! on responses or repeated query parameters on requests. Lookup is case-insensitive and
//! ASCII-only, matching RFC 7230's treatment of header field names.

/// ASCII case-insensitive equality, folding `'A'..='Z'` to lowercase.
#[inline]
fn eq_ignore_ascii_case(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.bytes().zip(b.bytes()).all(|(x, y)| x.to_ascii_lowercase() == y.to_ascii_lowercase())
}

/// An ordered multimap of `(String, String)` pairs.
#[derive(Debug, Clone, Default)]
pub struct KvList {
    pairs: Vec<(String, String)>,
}

impl KvList {
    #[inline]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self { pairs: Vec::with_capacity(cap) }
    }

    /// Appends a pair, never overwriting an existing one with the same key.
    #[inline]
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Returns the first value for `key`, case-insensitive.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| eq_ignore_ascii_case(k, key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.pairs
            .iter()
            .filter(move |(k, _)| eq_ignore_ascii_case(k, key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if any pair's key matches, case-insensitive.
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| eq_ignore_ascii_case(k, key))
    }

    /// Returns `true` if `key`'s (possibly comma-joined on the caller's side) value contains
    /// `token` as one of its comma-separated, OWS-trimmed members, case-insensitive. This is
    /// the shape `Connection` and `Transfer-Encoding` parsing needs.
    pub fn any_value_token(&self, key: &str, token: &str) -> bool {
        self.get_all(key)
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .any(|part| eq_ignore_ascii_case(part, token))
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Removes all pairs, retaining the backing allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}

impl<'a> IntoIterator for &'a KvList {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl FromIterator<(String, String)> for KvList {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self { pairs: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keys_are_retained() {
        let mut kv = KvList::new();
        kv.append("Set-Cookie", "a=1");
        kv.append("Set-Cookie", "b=2");
        assert_eq!(kv.get_all("set-cookie").collect::<Vec<_>>(), vec!["a=1", "b=2"]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut kv = KvList::new();
        kv.append("Content-Type", "text/plain");
        assert_eq!(kv.get("content-type"), Some("text/plain"));
        assert_eq!(kv.get("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn any_value_token_splits_on_comma() {
        let mut kv = KvList::new();
        kv.append("Connection", "keep-alive, Upgrade");
        assert!(kv.any_value_token("connection", "upgrade"));
        assert!(!kv.any_value_token("connection", "close"));
    }
}
