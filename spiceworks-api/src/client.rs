//! Blocking HTTP client for a Spiceworks helpdesk.
//!
//! The client is a thin wrapper around [`reqwest::blocking::Client`] with a
//! [`JarProvider`] installed as its cookie store. API methods live in
//! separate modules (`auth`, `tickets`) as `impl SpiceworksClient` blocks.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::{Result, SpiceworksError};
use crate::provider::JarProvider;

const USER_AGENT: &str = concat!("spiceworks-cli/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(30);

/// Cookie-aware client bound to one server and one set of credentials.
pub struct SpiceworksClient {
    http: Client,
    base_url: Url,
    credentials: Credentials,
    jar: Arc<JarProvider>,
}

impl SpiceworksClient {
    /// Build a client whose cookies are read from and written to `jar`.
    pub fn new(credentials: Credentials, jar: Arc<JarProvider>) -> Result<Self> {
        let base_url = credentials.base_url()?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .cookie_provider(Arc::clone(&jar))
            .build()?;
        Ok(Self {
            http,
            base_url,
            credentials,
            jar,
        })
    }

    /// Server root, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The jar backing this client's cookies.
    pub fn jar(&self) -> &Arc<JarProvider> {
        &self.jar
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Resolve `path` (relative, may carry a query) against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// GET `url` and return the body, failing on non-success statuses.
    pub(crate) fn get_text(&self, url: Url) -> Result<(Url, String)> {
        debug!(%url, "GET");
        let resp = self.http.get(url).send()?;
        read_body(resp)
    }
}

/// Final URL (after redirects) and body of a successful response.
pub(crate) fn read_body(resp: Response) -> Result<(Url, String)> {
    let status = resp.status();
    let url = resp.url().clone();
    if !status.is_success() {
        return Err(SpiceworksError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let body = resp.text()?;
    debug!(%url, status = status.as_u16(), bytes = body.len(), "response");
    Ok((url, body))
}
