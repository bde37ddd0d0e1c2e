//! The cookie store: per-host buckets persisted to one JSON file.
//!
//! File layout:
//!
//! ```json
//! {
//!   "cookies": {
//!     "helpdesk.example.com": {
//!       "_session": { "name": "_session", "value": "…", "expires": "9999-12-31T23:59:59Z", "session": true }
//!     }
//!   },
//!   "fingerprint": "5d41402abc4b2a76b9719d911017c592"
//! }
//! ```
//!
//! The file is read once by [`CookieStore::open`] and written once by
//! [`CookieStore::flush`]. It is not locked; concurrent runs race on flush
//! and the last writer wins.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use url::Url;

use crate::cookie::{Cookie, SetCookie};
use crate::error::{JarError, Result};
use crate::fingerprint::Fingerprint;

type Bucket = BTreeMap<String, Cookie>;
type Hosts = BTreeMap<String, Bucket>;

/// On-disk document.
#[derive(Debug, Default, Deserialize)]
struct JarFile {
    #[serde(default)]
    cookies: Hosts,
    #[serde(default)]
    fingerprint: Fingerprint,
}

#[derive(Serialize)]
struct JarFileRef<'a> {
    cookies: Cow<'a, Hosts>,
    fingerprint: &'a Fingerprint,
}

/// Tunables for a [`CookieStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Write session cookies to disk on flush.
    ///
    /// Defaults to `true`: session cookies survive across runs with their
    /// [`END_OF_TIME`](crate::END_OF_TIME) expiry, which is what keeps a
    /// login alive between invocations. Setting it to `false` drops them at
    /// flush time, as a browser would on exit.
    pub persist_session_cookies: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            persist_session_cookies: true,
        }
    }
}

/// In-memory cookie jar bound to a file path and a credential fingerprint.
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
    fingerprint: Fingerprint,
    options: StoreOptions,
    hosts: Hosts,
}

/// Bucket key for `url`: its host, without port.
///
/// Returns `None` for URLs without a host (`data:`, `file:` …).
pub fn host_key(url: &Url) -> Option<&str> {
    url.host_str().filter(|h| !h.is_empty())
}

impl CookieStore {
    /// An empty store that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>, fingerprint: Fingerprint) -> Self {
        Self {
            path: path.into(),
            fingerprint,
            options: StoreOptions::default(),
            hosts: Hosts::new(),
        }
    }

    /// Open the jar at `path` for the given credential `fingerprint`.
    ///
    /// Returns the store and whether the stored fingerprint matched. On a
    /// mismatch the stored cookies are ignored (the file itself is left
    /// alone until the next flush). A missing file is not an error; an
    /// unreadable or malformed one is.
    pub fn open(path: impl Into<PathBuf>, fingerprint: Fingerprint) -> Result<(Self, bool)> {
        Self::open_with(path, fingerprint, StoreOptions::default())
    }

    /// [`open`](Self::open) with explicit [`StoreOptions`].
    pub fn open_with(
        path: impl Into<PathBuf>,
        fingerprint: Fingerprint,
        options: StoreOptions,
    ) -> Result<(Self, bool)> {
        let path = path.into();
        let mut store = Self::new(path, fingerprint);
        store.options = options;

        if !store.path.exists() {
            debug!(path = %store.path.display(), "no cookie jar on disk");
            return Ok((store, false));
        }

        let data = fs::read_to_string(&store.path)?;
        let file: JarFile = serde_json::from_str(&data).map_err(JarError::Corrupt)?;

        let matched = file.fingerprint == store.fingerprint;
        if matched {
            store.hosts = rekey(file.cookies);
            debug!(
                path = %store.path.display(),
                hosts = store.hosts.len(),
                cookies = store.len(),
                "loaded cookie jar"
            );
        } else {
            info!(
                path = %store.path.display(),
                "credentials changed since the jar was written; ignoring stored cookies"
            );
        }
        Ok((store, matched))
    }

    /// Write the jar to its path, replacing the previous file.
    pub fn flush(&self) -> Result<()> {
        let cookies = if self.options.persist_session_cookies {
            Cow::Borrowed(&self.hosts)
        } else {
            Cow::Owned(self.without_session_cookies())
        };
        let doc = JarFileRef {
            cookies,
            fingerprint: &self.fingerprint,
        };
        let data = serde_json::to_string_pretty(&doc).map_err(JarError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), cookies = self.len(), "flushed cookie jar");
        Ok(())
    }

    /// Live cookies for `url`, evicting expired ones first.
    pub fn cookies(&mut self, url: &Url) -> Vec<Cookie> {
        self.cookies_at(url, Utc::now())
    }

    /// [`cookies`](Self::cookies) as of `now`.
    ///
    /// The result is ordered by name.
    pub fn cookies_at(&mut self, url: &Url, now: DateTime<Utc>) -> Vec<Cookie> {
        let Some(host) = host_key(url) else {
            return Vec::new();
        };
        self.prune_host(host, now);
        self.hosts
            .get(host)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Store cookies received from `url`.
    pub fn set_cookies<I>(&mut self, url: &Url, cookies: I)
    where
        I: IntoIterator<Item = SetCookie>,
    {
        self.set_cookies_at(url, cookies, Utc::now());
    }

    /// [`set_cookies`](Self::set_cookies) as of `now`.
    ///
    /// Each cookie is classified by [`SetCookie::lifetime`]; discarded ones
    /// (deletion directives, already expired) are skipped. A deletion
    /// directive does not remove a stored cookie of the same name.
    pub fn set_cookies_at<I>(&mut self, url: &Url, cookies: I, now: DateTime<Utc>)
    where
        I: IntoIterator<Item = SetCookie>,
    {
        let Some(host) = host_key(url) else {
            return;
        };
        for incoming in cookies {
            let name = incoming.name.clone();
            match incoming.into_cookie(now) {
                Some(cookie) => {
                    trace!(host, name = %cookie.name, session = cookie.session, "storing cookie");
                    self.hosts
                        .entry(host.to_owned())
                        .or_default()
                        .insert(cookie.name.clone(), cookie);
                }
                None => trace!(host, %name, "skipping discarded cookie"),
            }
        }
    }

    /// Evict every cookie expired as of `now`. Returns how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.hosts.retain(|_, bucket| {
            removed += evict_expired(bucket, now);
            !bucket.is_empty()
        });
        removed
    }

    fn prune_host(&mut self, host: &str, now: DateTime<Utc>) -> usize {
        let Some(bucket) = self.hosts.get_mut(host) else {
            return 0;
        };
        let removed = evict_expired(bucket, now);
        if bucket.is_empty() {
            self.hosts.remove(host);
        }
        if removed > 0 {
            debug!(host, removed, "evicted expired cookies");
        }
        removed
    }

    /// Look up one stored cookie without pruning.
    pub fn get(&self, host: &str, name: &str) -> Option<&Cookie> {
        self.hosts.get(host)?.get(name)
    }

    /// Hosts that currently hold at least one cookie.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }

    /// Total number of stored cookies across hosts.
    pub fn len(&self) -> usize {
        self.hosts.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Drop every cookie held in memory.
    pub fn clear(&mut self) {
        self.hosts.clear();
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the jar file at `path`. Returns whether a file was removed.
    pub fn remove(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    fn without_session_cookies(&self) -> Hosts {
        self.hosts
            .iter()
            .filter_map(|(host, bucket)| {
                let kept: Bucket = bucket
                    .iter()
                    .filter(|(_, c)| !c.session)
                    .map(|(n, c)| (n.clone(), c.clone()))
                    .collect();
                (!kept.is_empty()).then(|| (host.clone(), kept))
            })
            .collect()
    }
}

/// Key every loaded cookie by its own name and drop empty buckets.
fn rekey(hosts: Hosts) -> Hosts {
    hosts
        .into_iter()
        .filter_map(|(host, bucket)| {
            let bucket: Bucket = bucket
                .into_values()
                .map(|c| (c.name.clone(), c))
                .collect();
            (!bucket.is_empty()).then_some((host, bucket))
        })
        .collect()
}

fn evict_expired(bucket: &mut Bucket, now: DateTime<Utc>) -> usize {
    let before = bucket.len();
    bucket.retain(|_, c| !c.is_expired(now));
    before - bucket.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::END_OF_TIME;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn fp(s: &str) -> Fingerprint {
        Fingerprint::from(s)
    }

    fn names(cookies: &[Cookie]) -> Vec<&str> {
        cookies.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn open_missing_file_is_empty_and_unmatched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jar.json");
        let (store, matched) = CookieStore::open(&path, fp("a")).unwrap();
        assert!(!matched);
        assert!(store.is_empty());
        assert_eq!(store.fingerprint(), &fp("a"));
        assert!(!path.exists());
    }

    #[test]
    fn open_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jar.json");
        fs::write(&path, "{ not json").unwrap();
        let err = CookieStore::open(&path, fp("a")).unwrap_err();
        assert!(matches!(err, JarError::Corrupt(_)));
    }

    #[test]
    fn open_empty_object_is_unmatched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jar.json");
        fs::write(&path, "{}").unwrap();
        let (store, matched) = CookieStore::open(&path, fp("a")).unwrap();
        assert!(!matched);
        assert!(store.is_empty());
    }

    #[test]
    fn set_then_get_filters_discarded() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        let u = url("http://helpdesk.example.com/login");
        store.set_cookies_at(
            &u,
            [
                SetCookie::new("keep", "1").with_max_age(60),
                SetCookie::new("session", "2"),
                SetCookie::new("deleted", "3").with_max_age(-1),
                SetCookie::new("stale", "4").with_expires(now() - Duration::seconds(1)),
                SetCookie::new("future", "5").with_expires(now() + Duration::days(1)),
            ],
            now(),
        );
        let got = store.cookies_at(&u, now());
        assert_eq!(names(&got), ["future", "keep", "session"]);
        assert_eq!(got[2].value, "2");
    }

    #[test]
    fn later_cookie_overwrites_same_name() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        let u = url("http://h.example/");
        store.set_cookies_at(&u, [SetCookie::new("a", "old")], now());
        store.set_cookies_at(
            &u,
            [SetCookie::new("a", "mid"), SetCookie::new("a", "new")],
            now(),
        );
        let got = store.cookies_at(&u, now());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, "new");
    }

    #[test]
    fn deletion_directive_keeps_existing_cookie() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        let u = url("http://h.example/");
        store.set_cookies_at(&u, [SetCookie::new("a", "1")], now());
        store.set_cookies_at(&u, [SetCookie::new("a", "").with_max_age(-1)], now());
        let got = store.cookies_at(&u, now());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, "1");
    }

    #[test]
    fn expired_dash_dated_cookie_keeps_existing_cookie() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        let u = url("http://h.example/");
        store.set_cookies_at(&u, [SetCookie::new("_sw_session", "abc")], now());
        let deletion =
            SetCookie::parse("_sw_session=deleted; expires=Thu, 01-Jan-1970 00:00:01 GMT; path=/")
                .unwrap();
        store.set_cookies_at(&u, [deletion], now());
        let got = store.cookies_at(&u, now());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, "abc");
    }

    #[test]
    fn only_discarded_cookies_leave_no_bucket() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        let u = url("http://h.example/");
        store.set_cookies_at(&u, [SetCookie::new("a", "1").with_max_age(-1)], now());
        assert!(store.is_empty());
        assert_eq!(store.hosts().count(), 0);
    }

    #[test]
    fn port_is_ignored_for_host_key() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        store.set_cookies_at(&url("http://h.example:8080/"), [SetCookie::new("a", "1")], now());
        let got = store.cookies_at(&url("https://h.example/other"), now());
        assert_eq!(names(&got), ["a"]);
        assert_eq!(store.hosts().collect::<Vec<_>>(), ["h.example"]);
    }

    #[test]
    fn unknown_host_yields_nothing() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        store.set_cookies_at(&url("http://a.example/"), [SetCookie::new("a", "1")], now());
        assert!(store.cookies_at(&url("http://b.example/"), now()).is_empty());
    }

    #[test]
    fn expired_cookie_is_evicted_on_read() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        let u = url("http://h.example/");
        store.set_cookies_at(
            &u,
            [
                SetCookie::new("short", "1").with_max_age(3600),
                SetCookie::new("long", "2").with_max_age(7200),
            ],
            now(),
        );
        assert_eq!(store.cookies_at(&u, now()).len(), 2);

        let later = now() + Duration::seconds(3601);
        assert_eq!(names(&store.cookies_at(&u, later)), ["long"]);
        assert!(store.get("h.example", "short").is_none());
        assert_eq!(names(&store.cookies_at(&u, later)), ["long"]);
    }

    #[test]
    fn expiry_exactly_now_counts_as_expired() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        let u = url("http://h.example/");
        store.set_cookies_at(&u, [SetCookie::new("a", "1").with_max_age(10)], now());
        assert!(store.cookies_at(&u, now() + Duration::seconds(10)).is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn prune_sweeps_all_hosts() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        store.set_cookies_at(&url("http://a.example/"), [SetCookie::new("x", "1").with_max_age(5)], now());
        store.set_cookies_at(&url("http://b.example/"), [SetCookie::new("y", "1").with_max_age(5)], now());
        store.set_cookies_at(&url("http://b.example/"), [SetCookie::new("z", "1")], now());
        assert_eq!(store.prune(now() + Duration::minutes(1)), 2);
        assert_eq!(store.hosts().collect::<Vec<_>>(), ["b.example"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn session_cookies_survive_pruning() {
        let mut store = CookieStore::new("unused.json", fp("a"));
        let u = url("http://h.example/");
        store.set_cookies_at(&u, [SetCookie::new("s", "1")], now());
        assert_eq!(store.prune(now() + Duration::days(365 * 100)), 0);
        let c = store.get("h.example", "s").unwrap();
        assert!(c.session);
        assert_eq!(c.expires, Some(*END_OF_TIME));
    }

    #[test]
    fn flush_then_open_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("jar.json");
        let u = url("http://h.example/");

        let mut store = CookieStore::new(&path, fp("a"));
        store.set_cookies_at(
            &u,
            [
                SetCookie::new("s", "1"),
                SetCookie::new("p", "2").with_expires(Utc::now() + Duration::days(30)),
            ],
            Utc::now(),
        );
        store.flush().unwrap();

        let (mut reopened, matched) = CookieStore::open(&path, fp("a")).unwrap();
        assert!(matched);
        assert_eq!(reopened.get("h.example", "s"), store.get("h.example", "s"));
        assert_eq!(reopened.get("h.example", "p"), store.get("h.example", "p"));
        assert_eq!(reopened.cookies(&u).len(), 2);

        reopened.flush().unwrap();
        let first = fs::read_to_string(&path).unwrap();
        CookieStore::open(&path, fp("a")).unwrap().0.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn fingerprint_mismatch_discards_cookies_but_not_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jar.json");
        let u = url("http://h.example/");

        let mut store = CookieStore::new(&path, fp("b"));
        store.set_cookies(&u, [SetCookie::new("s", "1")]);
        store.flush().unwrap();
        let on_disk = fs::read_to_string(&path).unwrap();

        let (mut store, matched) = CookieStore::open(&path, fp("a")).unwrap();
        assert!(!matched);
        assert!(store.cookies(&u).is_empty());
        assert_eq!(store.fingerprint(), &fp("a"));
        assert_eq!(fs::read_to_string(&path).unwrap(), on_disk);

        store.flush().unwrap();
        let (_, matched) = CookieStore::open(&path, fp("a")).unwrap();
        assert!(matched);
    }

    #[test]
    fn session_cookies_can_be_left_out_of_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jar.json");
        let u = url("http://h.example/");
        let options = StoreOptions {
            persist_session_cookies: false,
        };

        let (mut store, _) = CookieStore::open_with(&path, fp("a"), options).unwrap();
        store.set_cookies(
            &u,
            [
                SetCookie::new("s", "1"),
                SetCookie::new("p", "2").with_max_age(600),
            ],
        );
        store.flush().unwrap();
        assert_eq!(store.len(), 2);

        let (mut reopened, matched) = CookieStore::open(&path, fp("a")).unwrap();
        assert!(matched);
        assert_eq!(names(&reopened.cookies(&u)), ["p"]);
    }

    #[test]
    fn login_scenario_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jar.json");
        let host = url("http://helpdesk.example.com/");
        let fingerprint = Fingerprint::compute("helpdesk.example.com", "me@example.com", "pw");

        let (mut store, matched) = CookieStore::open(&path, fingerprint.clone()).unwrap();
        assert!(!matched);
        store.set_cookies(&host, [SetCookie::new("session", "abc")]);
        store.flush().unwrap();

        let (mut store, matched) = CookieStore::open(&path, fingerprint).unwrap();
        assert!(matched);
        let got = store.cookies(&host);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "session");
        assert_eq!(got[0].value, "abc");
    }

    #[test]
    fn flush_under_a_regular_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = CookieStore::new(blocker.join("jar.json"), fp("a"));
        let err = store.flush().unwrap_err();
        assert!(matches!(err, JarError::Io(_)));
    }

    #[test]
    fn loaded_cookies_are_keyed_by_their_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jar.json");
        fs::write(
            &path,
            r#"{
              "cookies": {
                "h.example": {
                  "alias": { "name": "a", "value": "old", "expires": "9999-12-31T23:59:59Z" }
                },
                "empty.example": {}
              },
              "fingerprint": "a"
            }"#,
        )
        .unwrap();

        let (mut store, matched) = CookieStore::open(&path, fp("a")).unwrap();
        assert!(matched);
        assert!(store.get("h.example", "alias").is_none());
        assert_eq!(store.hosts().collect::<Vec<_>>(), ["h.example"]);

        let u = url("http://h.example/");
        store.set_cookies_at(&u, [SetCookie::new("a", "new")], now());
        let got = store.cookies_at(&u, now());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, "new");
    }

    #[test]
    fn remove_deletes_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jar.json");
        assert!(!CookieStore::remove(&path).unwrap());
        CookieStore::new(&path, fp("a")).flush().unwrap();
        assert!(CookieStore::remove(&path).unwrap());
        assert!(!path.exists());
    }
}
