//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default jar file name, relative to the home directory.
pub const DEFAULT_JAR_FILE: &str = ".spiceworks_cookiejar.json";

/// List Spiceworks helpdesk tickets from the command line.
///
/// Credentials come from flags or the `SPICEWORKS_*` environment variables.
/// The login session is cached in a cookie jar and reused until the
/// credentials change.
#[derive(Parser, Debug)]
#[command(name = "spiceworks", version, about)]
pub struct Cli {
    /// Spiceworks server, e.g. helpdesk.example.com
    #[arg(short, long, env = "SPICEWORKS_SERVER")]
    pub server: Option<String>,

    /// Email address to log in with
    #[arg(short, long, env = "SPICEWORKS_EMAIL")]
    pub email: Option<String>,

    /// Password to log in with
    #[arg(short, long, env = "SPICEWORKS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Prettify output: aligned columns, truncated summaries
    #[arg(short = 'P', long)]
    pub pretty: bool,

    /// Cookie jar location [default: ~/.spiceworks_cookiejar.json]
    #[arg(long, env = "SPICEWORKS_COOKIE_JAR", value_name = "PATH")]
    pub cookie_jar: Option<PathBuf>,

    /// Ignore cached cookies and log in again
    #[arg(long)]
    pub relogin: bool,

    /// Do not write session cookies to the jar
    #[arg(long)]
    pub no_session_cookies: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List tickets (the default)
    Tickets {
        /// Server-side ticket filter
        #[arg(short, long, default_value = "open")]
        filter: String,
    },
    /// Delete the saved cookie jar
    Logout,
}

impl Default for Command {
    fn default() -> Self {
        Self::Tickets {
            filter: "open".to_owned(),
        }
    }
}

impl Cli {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
