//! Data types for Spiceworks API responses.

use serde::{Deserialize, Serialize};

/// A helpdesk ticket from `/api/tickets.json`.
///
/// API JSON fields: `id`, `summary` (HTML-escaped by the server),
/// `assignee` (object or `null`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    /// One-line summary, already HTML-unescaped.
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub assignee: Option<Assignee>,
}

/// The technician a ticket is assigned to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Ticket {
    /// `"First Last"`, or `"Unassigned"` when nobody holds the ticket.
    pub fn assignee_name(&self) -> String {
        match &self.assignee {
            Some(a) if !(a.first_name.is_empty() && a.last_name.is_empty()) => {
                format!("{} {}", a.first_name, a.last_name).trim().to_owned()
            }
            _ => "Unassigned".to_owned(),
        }
    }
}
