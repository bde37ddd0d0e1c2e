use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use spiceworks_api::cookiejar::CookieStore;
use spiceworks_api::{Credentials, Session, SessionConfig};
use tracing::{debug, warn};

mod cli;
mod output;

use cli::{Cli, Command, DEFAULT_JAR_FILE};

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    let jar_path = match cli.cookie_jar.clone() {
        Some(path) => path,
        None => default_jar_path()?,
    };
    debug!(jar = %jar_path.display(), "using cookie jar");

    match cli.command.take().unwrap_or_default() {
        Command::Tickets { filter } => cmd_tickets(&cli, jar_path, &filter),
        Command::Logout => cmd_logout(&jar_path),
    }
}

fn default_jar_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(DEFAULT_JAR_FILE))
}

// ── tickets ──

fn cmd_tickets(cli: &Cli, jar_path: PathBuf, filter: &str) -> Result<()> {
    let credentials = Credentials::new(
        cli.server.clone().unwrap_or_default(),
        cli.email.clone().unwrap_or_default(),
        cli.password.clone().unwrap_or_default(),
    );
    credentials
        .validate()
        .context("--server, --email, and --password are required")?;

    let mut config = SessionConfig::new(credentials, jar_path).force_login(cli.relogin);
    config.store_options.persist_session_cookies = !cli.no_session_cookies;

    let session = Session::open(config).context("failed to open session")?;
    let outcome = session
        .tickets(Some(filter))
        .context("failed to fetch tickets")
        .and_then(|tickets| {
            output::write_tickets(&mut io::stdout().lock(), &tickets, cli.pretty)
                .context("failed to write output")
        });

    finish(session, outcome)
}

/// Save the jar and hand back `outcome`. A failed save is only logged.
fn finish(session: Session, outcome: Result<()>) -> Result<()> {
    if let Err(e) = session.close() {
        warn!(error = %e, "failed to save cookie jar");
    }
    outcome
}

// ── logout ──

fn cmd_logout(jar_path: &Path) -> Result<()> {
    if CookieStore::remove(jar_path)
        .with_context(|| format!("failed to remove {}", jar_path.display()))?
    {
        println!("Session cleared.");
    } else {
        println!("No saved session.");
    }
    Ok(())
}
