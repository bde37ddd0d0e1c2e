//! Credential fingerprint used to key a jar file.
//!
//! The fingerprint is the lowercase hex MD5 of `server ‖ email ‖ password`.
//! MD5 is only used as a stable cache key here, never for secrecy.

use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Digest of the credentials a jar was populated with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest the credential triple. Input order is significant.
    pub fn compute(server: &str, email: &str, password: &str) -> Self {
        let mut hasher = Md5::new();
        for part in [server, email, password] {
            hasher.update(part.as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
