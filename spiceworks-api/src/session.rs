//! Session orchestration: reuse cached cookies or log in.
//!
//! A [`Session`] owns the cookie jar for one CLI run:
//!
//! 1. open the jar for the credentials' fingerprint,
//! 2. log in only when the fingerprint did not match (or a fresh login was
//!    requested),
//! 3. serve API calls through a client that reads and writes the jar,
//! 4. flush the jar once, in [`Session::close`].
//!
//! A failed login aborts [`Session::open`] before anything is written, so a
//! rejected password never gets recorded as the jar's fingerprint.

use std::path::PathBuf;
use std::sync::Arc;

use cookiejar::{CookieStore, StoreOptions};
use tracing::{debug, info};

use crate::auth::Credentials;
use crate::client::SpiceworksClient;
use crate::error::Result;
use crate::provider::JarProvider;
use crate::types::Ticket;

/// Everything needed to open a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub credentials: Credentials,
    /// Location of the cookie jar file.
    pub jar_path: PathBuf,
    /// Discard cached cookies and log in even if the fingerprint matches.
    pub force_login: bool,
    pub store_options: StoreOptions,
}

impl SessionConfig {
    pub fn new(credentials: Credentials, jar_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials,
            jar_path: jar_path.into(),
            force_login: false,
            store_options: StoreOptions::default(),
        }
    }

    #[must_use]
    pub fn force_login(mut self, yes: bool) -> Self {
        self.force_login = yes;
        self
    }
}

/// Log in unless the cached cookies belong to the current credentials.
///
/// The login error, if any, is returned unchanged.
pub fn ensure_authenticated<F>(fingerprint_matched: bool, login: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    if fingerprint_matched {
        debug!("reusing cached session cookies");
        return Ok(());
    }
    login()
}

/// An authenticated client plus the jar it persists to.
pub struct Session {
    client: SpiceworksClient,
    logged_in: bool,
}

impl Session {
    /// Open the jar and make sure the session is authenticated.
    pub fn open(config: SessionConfig) -> Result<Self> {
        let SessionConfig {
            credentials,
            jar_path,
            force_login,
            store_options,
        } = config;
        credentials.validate()?;

        let (mut store, matched) =
            CookieStore::open_with(jar_path, credentials.fingerprint(), store_options)?;
        if force_login && matched {
            info!("ignoring cached cookies, logging in again");
            store.clear();
        }
        let reuse = matched && !force_login;

        let jar = Arc::new(JarProvider::new(store));
        let client = SpiceworksClient::new(credentials, jar)?;
        ensure_authenticated(reuse, || client.login())?;

        Ok(Self {
            client,
            logged_in: !reuse,
        })
    }

    /// Whether this session had to log in (as opposed to reusing the jar).
    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    /// See [`SpiceworksClient::tickets`].
    pub fn tickets(&self, filter: Option<&str>) -> Result<Vec<Ticket>> {
        self.client.tickets(filter)
    }

    /// Persist the jar. Call once, at the end of the run.
    pub fn close(self) -> Result<()> {
        self.client.jar().flush()?;
        Ok(())
    }
}
