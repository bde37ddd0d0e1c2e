//! Spiceworks helpdesk client with a persistent cookie session.
//!
//! Authentication is cookie based: the client logs in once by scraping the
//! `authenticity_token` from the login form and posting the credentials,
//! and every later request carries the session cookie the server set. The
//! cookies live in a [`cookiejar::CookieStore`] on disk, keyed by a
//! fingerprint of the credentials, so subsequent runs skip the login.
//!
//! ```no_run
//! use spiceworks_api::{Credentials, Session, SessionConfig};
//!
//! let credentials = Credentials::new("helpdesk.example.com", "me@example.com", "hunter2");
//! let session = Session::open(SessionConfig::new(credentials, "/tmp/jar.json")).unwrap();
//! for ticket in session.tickets(Some("open")).unwrap() {
//!     println!("{} {}", ticket.id, ticket.summary);
//! }
//! session.close().unwrap();
//! ```
//!
//! # Endpoints
//!
//! | Method                                  | Request                          |
//! |-----------------------------------------|----------------------------------|
//! | [`SpiceworksClient::login`]             | `GET /login`, `POST /login`      |
//! | [`SpiceworksClient::tickets`]           | `GET /api/tickets.json?filter=…` |

pub mod auth;
pub mod client;
pub mod error;
mod html;
pub mod provider;
pub mod session;
mod tickets;
pub mod types;

pub use cookiejar;

pub use auth::Credentials;
pub use client::SpiceworksClient;
pub use error::{Result, SpiceworksError};
pub use provider::JarProvider;
pub use session::{Session, SessionConfig, ensure_authenticated};
pub use types::{Assignee, Ticket};
