//! Credentials and the login flow.
//!
//! Logging in is a two-step form submission:
//!
//! 1. `GET /login` and scrape the CSRF token from
//!    `<input name="authenticity_token" value="…">`.
//! 2. `POST /login` with the form fields
//!
//!    | Field                | Value          |
//!    |----------------------|----------------|
//!    | `authenticity_token` | scraped token  |
//!    | `user[email]`        | email          |
//!    | `user[password]`     | password       |
//!    | `user[remember]`     | `1`            |
//!
//! The server answers with the session cookie (captured by the jar) and a
//! page that contains `Login failed` when the credentials were rejected.

use std::fmt;
use std::sync::LazyLock;

use cookiejar::Fingerprint;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

use crate::client::{SpiceworksClient, read_body};
use crate::error::{Result, SpiceworksError};
use crate::html;

const LOGIN_FAILED_MARKER: &str = "Login failed";

static INPUT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("input tag regex is valid"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute regex is valid")
});

/// Server address and login for one helpdesk account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Host name (`helpdesk.example.com`) or full base URL.
    pub server: String,
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        server: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Reject blank fields.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("server", &self.server),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(SpiceworksError::MissingCredentials(field));
            }
        }
        Ok(())
    }

    /// Fingerprint keying the cookie jar to these credentials.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(&self.server, &self.email, &self.password)
    }

    /// `http://{server}/`, or `server` itself when it already has a scheme.
    pub fn base_url(&self) -> Result<Url> {
        let server = self.server.trim();
        let mut raw = if server.starts_with("http://") || server.starts_with("https://") {
            server.to_owned()
        } else {
            format!("http://{server}")
        };
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server", &self.server)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SpiceworksClient {
    /// Log in, leaving the session cookie in the jar.
    ///
    /// # Errors
    ///
    /// - [`SpiceworksError::MissingToken`] — login page has no CSRF token
    /// - [`SpiceworksError::LoginFailed`] — credentials rejected
    /// - [`SpiceworksError::Http`] / [`SpiceworksError::Status`] — transport
    pub fn login(&self) -> Result<()> {
        let login_url = self.endpoint("login")?;

        let (_, page) = self.get_text(login_url.clone())?;
        let token = extract_authenticity_token(&page).ok_or(SpiceworksError::MissingToken)?;
        debug!("found authenticity_token");

        let creds = self.credentials();
        let form = [
            ("authenticity_token", token.as_str()),
            ("user[email]", creds.email.as_str()),
            ("user[password]", creds.password.as_str()),
            ("user[remember]", "1"),
        ];
        let resp = self.http().post(login_url).form(&form).send()?;
        let (_, body) = read_body(resp)?;

        if body.contains(LOGIN_FAILED_MARKER) {
            return Err(SpiceworksError::LoginFailed);
        }
        info!(email = %creds.email, "logged in");
        Ok(())
    }
}

/// Value of the first `<input name="authenticity_token">` in `page`.
pub fn extract_authenticity_token(page: &str) -> Option<String> {
    INPUT_TAG_RE.find_iter(page).find_map(|tag| {
        let mut name = None;
        let mut value = None;
        for attr in ATTR_RE.captures_iter(tag.as_str()) {
            let key = attr.get(1).map_or("", |m| m.as_str());
            let val = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());
            if key.eq_ignore_ascii_case("name") {
                name = Some(val);
            } else if key.eq_ignore_ascii_case("value") {
                value = Some(val);
            }
        }
        (name == Some("authenticity_token"))
            .then(|| value.map(html::unescape))
            .flatten()
    })
}
