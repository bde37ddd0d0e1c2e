//! Error types for the Spiceworks client.

use thiserror::Error;

/// Errors that can occur while talking to a Spiceworks server.
#[derive(Debug, Error)]
pub enum SpiceworksError {
    /// HTTP transport error (connection refused, timeout, TLS failure, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success HTTP status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The login page has no `authenticity_token` input.
    #[error("couldn't find authenticity_token on the login page")]
    MissingToken,

    /// The server rejected the credentials.
    #[error("login failed: check email and password")]
    LoginFailed,

    /// An API request was bounced to the login page.
    ///
    /// Usually means the server expired the stored session cookie.
    #[error("not logged in (session expired?); retry with --relogin")]
    NotAuthenticated,

    /// The API response was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Loading or saving the cookie jar failed.
    #[error(transparent)]
    Jar(#[from] cookiejar::JarError),

    /// The server address does not form a valid URL.
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A required credential is blank.
    #[error("missing {0}")]
    MissingCredentials(&'static str),
}

/// Convenience alias for `Result<T, SpiceworksError>`.
pub type Result<T> = std::result::Result<T, SpiceworksError>;
