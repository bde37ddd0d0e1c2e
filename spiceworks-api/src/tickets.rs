//! Ticket listing.
//!
//! Endpoint: `GET /api/tickets.json[?filter={filter}]`
//!
//! Response (first page only, up to 100 tickets):
//! ```json
//! [
//!   {
//!     "id": 1234,
//!     "summary": "Printer on 2nd floor &quot;offline&quot;",
//!     "assignee": { "first_name": "Ada", "last_name": "Lovelace" }
//!   }
//! ]
//! ```
//!
//! The only filter known to work is `open`. When the stored session has
//! been expired by the server, the request is redirected to `/login`.

use tracing::debug;

use crate::client::SpiceworksClient;
use crate::error::{Result, SpiceworksError};
use crate::html;
use crate::types::Ticket;

impl SpiceworksClient {
    /// Fetch the first page of tickets, optionally filtered.
    ///
    /// # Errors
    ///
    /// - [`SpiceworksError::NotAuthenticated`] — bounced to the login page
    /// - [`SpiceworksError::Json`] — body is not a ticket list
    pub fn tickets(&self, filter: Option<&str>) -> Result<Vec<Ticket>> {
        let path = match filter.filter(|f| !f.is_empty()) {
            Some(f) => format!("api/tickets.json?filter={}", urlencoding::encode(f)),
            None => "api/tickets.json".to_owned(),
        };
        let (final_url, body) = self.get_text(self.endpoint(&path)?)?;
        if final_url.path().ends_with("/login") {
            return Err(SpiceworksError::NotAuthenticated);
        }

        let tickets = parse_tickets(&body)?;
        debug!(count = tickets.len(), ?filter, "fetched tickets");
        Ok(tickets)
    }
}

fn parse_tickets(body: &str) -> Result<Vec<Ticket>> {
    let mut tickets: Vec<Ticket> = serde_json::from_str(body)?;
    for ticket in &mut tickets {
        ticket.summary = html::unescape(&ticket.summary);
    }
    Ok(tickets)
}
