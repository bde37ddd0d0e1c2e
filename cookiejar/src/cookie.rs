//! Cookie records and `Set-Cookie` classification.
//!
//! Two shapes exist:
//!
//! - [`SetCookie`] — an incoming cookie as parsed from a `Set-Cookie`
//!   response header. Carries the raw `Max-Age`/`Expires` attributes.
//! - [`Cookie`] — a cookie as kept in the jar, with an absolute expiry.
//!
//! [`SetCookie::lifetime`] decides which incoming cookies become stored
//! cookies, and for how long.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Expiry assigned to session cookies: `9999-12-31T23:59:59Z`.
///
/// Far enough away that pruning never touches it, and still representable
/// in RFC 3339 and HTTP dates.
pub static END_OF_TIME: LazyLock<DateTime<Utc>> = LazyLock::new(|| {
    DateTime::from_timestamp(253_402_300_799, 0).expect("9999-12-31T23:59:59Z is representable")
});

/// A cookie stored in the jar.
///
/// JSON form:
///
/// ```json
/// { "name": "session", "value": "abc", "expires": "9999-12-31T23:59:59Z", "session": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name, unique within one host.
    pub name: String,
    /// Cookie value, sent back verbatim.
    pub value: String,
    /// Absolute expiry. `None` never expires (only seen in hand-written jars).
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    /// Whether the server sent this cookie without `Max-Age` or `Expires`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub session: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(v: &bool) -> bool {
    !*v
}

impl Cookie {
    /// A cookie that is dropped once `now` reaches `expires`.
    pub fn persistent(
        name: impl Into<String>,
        value: impl Into<String>,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: Some(expires),
            session: false,
        }
    }

    /// A session cookie, expiring at [`END_OF_TIME`].
    pub fn session(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: Some(*END_OF_TIME),
            session: true,
        }
    }

    /// True once `expires` is not strictly after `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|t| t <= now)
    }

    /// `name=value`, as sent in a `Cookie` request header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// How long an incoming cookie lives in the jar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Lives until the process exits (stored with [`END_OF_TIME`]).
    Session,
    /// Lives until the given instant.
    ExpiresAt(DateTime<Utc>),
    /// Not stored: a deletion directive, or already expired on arrival.
    Discard,
}

/// A cookie as received in a `Set-Cookie` header.
///
/// `max_age` follows the header semantics after normalization:
/// `0` means no `Max-Age` attribute, a negative value means "delete now"
/// (a literal `Max-Age=0` is normalized to `-1`), and a positive value is
/// the lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: i64,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: None,
            max_age: 0,
        }
    }

    #[must_use]
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = seconds;
        self
    }

    #[must_use]
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Parse a single `Set-Cookie` header value.
    ///
    /// Only `Max-Age` and `Expires` are interpreted; `Path`, `Domain` and
    /// the flag attributes are accepted and ignored. Returns `None` when the
    /// leading `name=value` pair is missing or the name is empty.
    pub fn parse(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Self::new(name, strip_quotes(value.trim()));

        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (attr.trim(), ""),
            };
            if key.eq_ignore_ascii_case("max-age") {
                if let Some(secs) = parse_max_age(val) {
                    cookie.max_age = secs;
                }
            } else if key.eq_ignore_ascii_case("expires") {
                cookie.expires = parse_expires(val);
            }
        }
        Some(cookie)
    }

    /// Classify this cookie as seen at `now`.
    ///
    /// Precedence: a deletion directive wins, then `Max-Age`, then the
    /// explicit `Expires`. A cookie with neither is a session cookie.
    pub fn lifetime(&self, now: DateTime<Utc>) -> Lifetime {
        match (self.max_age, self.expires) {
            (age, _) if age < 0 => Lifetime::Discard,
            (age, _) if age > 0 => Lifetime::ExpiresAt(expires_after(now, age)),
            (_, None) => Lifetime::Session,
            (_, Some(t)) if t <= now => Lifetime::Discard,
            (_, Some(t)) => Lifetime::ExpiresAt(t),
        }
    }

    /// Turn this into a stored [`Cookie`], or `None` if it is discarded.
    pub fn into_cookie(self, now: DateTime<Utc>) -> Option<Cookie> {
        match self.lifetime(now) {
            Lifetime::Discard => None,
            Lifetime::Session => Some(Cookie::session(self.name, self.value)),
            Lifetime::ExpiresAt(t) => Some(Cookie::persistent(self.name, self.value, t)),
        }
    }
}

/// `now + seconds`, capped at [`END_OF_TIME`] so the result always
/// survives a round trip through the jar file.
fn expires_after(now: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    Duration::try_seconds(seconds)
        .and_then(|d| now.checked_add_signed(d))
        .map_or(*END_OF_TIME, |t| t.min(*END_OF_TIME))
}

/// Header-level `Max-Age`: non-positive values become `-1`; values with a
/// leading zero (other than `0` itself) are rejected.
fn parse_max_age(val: &str) -> Option<i64> {
    let secs: i64 = val.parse().ok()?;
    if secs != 0 && val.starts_with('0') {
        return None;
    }
    Some(if secs <= 0 { -1 } else { secs })
}

const NETSCAPE_EXPIRES: &str = "%a, %d-%b-%Y %H:%M:%S GMT";

/// `Expires` date: the HTTP date formats, then the Netscape
/// `Thu, 01-Jan-1970 00:00:01 GMT` form still common in deletion headers.
fn parse_expires(val: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = httpdate::parse_http_date(val) {
        return Some(DateTime::<Utc>::from(t));
    }
    NaiveDateTime::parse_from_str(val, NETSCAPE_EXPIRES)
        .ok()
        .map(|dt| dt.and_utc())
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
