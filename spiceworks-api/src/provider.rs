//! Cookie-aware transport hook backed by the on-disk jar.
//!
//! [`JarProvider`] plugs a [`cookiejar::CookieStore`] into reqwest through
//! [`reqwest::cookie::CookieStore`]: every response's `Set-Cookie` headers
//! are fed into [`CookieStore::set_cookies`], and every request gets a
//! `Cookie` header built from [`CookieStore::cookies`].
//!
//! reqwest requires the provider to be `Send + Sync`, hence the mutex. The
//! client is only ever driven from one thread.

use std::sync::{Mutex, PoisonError};

use cookiejar::{Cookie, CookieStore, SetCookie};
use reqwest::header::HeaderValue;
use tracing::warn;
use url::Url;

/// Shared handle to the jar, installed as the HTTP client's cookie provider.
#[derive(Debug)]
pub struct JarProvider {
    store: Mutex<CookieStore>,
}

impl JarProvider {
    pub fn new(store: CookieStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Run `f` with exclusive access to the underlying store.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut CookieStore) -> R) -> R {
        let mut guard = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Write the jar to disk.
    pub fn flush(&self) -> cookiejar::Result<()> {
        self.with_store(|store| store.flush())
    }
}

impl reqwest::cookie::CookieStore for JarProvider {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let cookies: Vec<SetCookie> = cookie_headers
            .filter_map(|h| h.to_str().ok())
            .filter_map(|raw| {
                let parsed = SetCookie::parse(raw);
                if parsed.is_none() {
                    warn!(%url, "ignoring malformed Set-Cookie header");
                }
                parsed
            })
            .collect();
        if !cookies.is_empty() {
            self.with_store(|store| store.set_cookies(url, cookies));
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .with_store(|store| store.cookies(url))
            .iter()
            .map(Cookie::pair)
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}
