//! `Set-Cookie` records attached to a response, and the `Cookie` request header jar.
use std::fmt::Write as _;

use crate::kv::KvList;

/// Parses a request's `Cookie` header value into a key-value jar.
///
/// Pairs are separated by `; ` (a bare `;` is also accepted, matching real-world clients that
/// omit the space); a segment with no `=` is skipped rather than rejected, since a malformed
/// cookie pair should not fail the whole request.
pub fn parse_jar(raw: &str) -> KvList {
    let mut kv = KvList::new();
    for segment in raw.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some(idx) = segment.find('=') else { continue };
        let (name, value) = (segment[..idx].trim(), segment[idx + 1..].trim());
        if name.is_empty() {
            continue;
        }
        kv.append(name.to_string(), value.to_string());
    }
    kv
}

/// `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    const fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// A single `Set-Cookie` value, rendered as one header line per cookie.
#[derive(Debug, Clone, Default)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    max_age: Option<i64>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), ..Default::default() }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Renders the `Set-Cookie` header value, excluding the header name itself.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(64);
        let _ = write!(out, "{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            let _ = write!(out, "; Path={path}");
        }
        if let Some(domain) = &self.domain {
            let _ = write!(out, "; Domain={domain}");
        }
        if let Some(max_age) = self.max_age {
            let _ = write!(out, "; Max-Age={max_age}");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            let _ = write!(out, "; SameSite={}", same_site.as_str());
        }
        out
    }
}
