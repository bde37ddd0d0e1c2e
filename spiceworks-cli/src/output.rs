//! Ticket list formatting.

use std::io::{self, Write};

use spiceworks_api::Ticket;

const PRETTY_SUMMARY_TRUNC: usize = 80;
const PRETTY_PADDING: usize = 2;

/// Write one line per ticket.
///
/// Plain output is `id<TAB>summary<TAB>assignee`. Pretty output aligns the
/// columns under a bold header and truncates long summaries.
pub fn write_tickets<W: Write>(w: &mut W, tickets: &[Ticket], pretty: bool) -> io::Result<()> {
    if !pretty {
        for t in tickets {
            writeln!(w, "{}\t{}\t{}", t.id, t.summary, t.assignee_name())?;
        }
        return Ok(());
    }

    let rows: Vec<(String, String, String)> = tickets
        .iter()
        .map(|t| (t.id.to_string(), truncate(&t.summary), t.assignee_name()))
        .collect();
    let id_width = column_width("ID", rows.iter().map(|r| r.0.as_str()));
    let summary_width = column_width("SUMMARY", rows.iter().map(|r| r.1.as_str()));

    writeln!(
        w,
        "\x1b[1m{:<id_width$}{:<summary_width$}ASSIGNEE\x1b[0m",
        "ID", "SUMMARY"
    )?;
    for (id, summary, assignee) in &rows {
        writeln!(w, "{id:<id_width$}{summary:<summary_width$}{assignee}")?;
    }
    Ok(())
}

fn column_width<'a>(header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells
        .map(|c| c.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
        + PRETTY_PADDING
}

fn truncate(summary: &str) -> String {
    if summary.chars().count() <= PRETTY_SUMMARY_TRUNC - 3 {
        return summary.to_owned();
    }
    let mut out: String = summary.chars().take(PRETTY_SUMMARY_TRUNC - 3).collect();
    out.push_str("...");
    out
}
