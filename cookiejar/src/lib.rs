//! File-backed cookie jar for command-line HTTP clients.
//!
//! The jar keeps cookies per host (port stripped) and persists them to a
//! single JSON document together with a [`Fingerprint`] of the credentials
//! that produced them. When the fingerprint on disk no longer matches the
//! current credentials, the stored cookies are ignored and the caller is
//! expected to log in again.
//!
//! ```no_run
//! use cookiejar::{CookieStore, Fingerprint};
//!
//! let fp = Fingerprint::compute("helpdesk.example.com", "me@example.com", "hunter2");
//! let (mut store, matched) = CookieStore::open("/tmp/jar.json", fp).unwrap();
//! if !matched {
//!     // log in, feeding Set-Cookie headers into `store.set_cookies(..)`
//! }
//! store.flush().unwrap();
//! ```
//!
//! # Expiry
//!
//! Every read ([`CookieStore::cookies`]) first evicts the requested host's
//! expired cookies; [`CookieStore::prune`] sweeps all hosts at once.
//! Session cookies carry [`END_OF_TIME`] as their expiry and are tagged so
//! callers can tell them apart from persistent ones.

mod cookie;
pub mod error;
mod fingerprint;
mod store;

pub use cookie::{Cookie, END_OF_TIME, Lifetime, SetCookie};
pub use error::{JarError, Result};
pub use fingerprint::Fingerprint;
pub use store::{CookieStore, StoreOptions, host_key};
