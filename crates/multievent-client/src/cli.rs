//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputMode;

/// multievent - create the same event at several times in one go
#[derive(Debug, Parser)]
#[command(name = "multievent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "MULTIEVENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in or out
    #[cfg(feature = "google")]
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// List the calendars events can be added to
    #[cfg(feature = "google")]
    Calendars,

    /// Create one event per start time
    #[cfg(feature = "google")]
    Add(AddArgs),

    /// Show or set per-calendar default field values
    Defaults {
        #[command(subcommand)]
        action: DefaultsAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[cfg(feature = "google")]
#[derive(Debug, Subcommand)]
pub enum AuthAction {
    /// Sign in to Google Calendar
    Google {
        /// OAuth client ID (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Path to a Google Cloud Console credentials JSON file
        #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
        credentials_file: Option<PathBuf>,

        /// Sign in again even if tokens are already saved
        #[arg(long, short)]
        force: bool,
    },

    /// Delete the saved tokens
    Logout,
}

/// Arguments of `multievent add`.
#[derive(Debug, Clone, Default, Args)]
pub struct AddArgs {
    /// Calendar to add to (defaults to the last one used, then `primary`)
    #[arg(long)]
    pub calendar: Option<String>,

    /// Event title
    #[arg(long)]
    pub title: Option<String>,

    /// Start time; repeat, or separate several with `;` or `,`
    ///
    /// RFC 3339 (`2024-01-01T09:00:00+01:00`), or local
    /// `YYYY-MM-DD HH:MM[:SS]` / `YYYY-MM-DD`.
    #[arg(long = "start", short, action = clap::ArgAction::Append)]
    pub starts: Vec<String>,

    /// Duration as HH:MM; 00:00 creates all-day events
    #[arg(long, short)]
    pub duration: Option<String>,

    /// Popup reminder in minutes before the start (default: calendar's own)
    #[arg(long, short)]
    pub reminder: Option<String>,

    /// Remember the given title, duration and reminder for this calendar
    #[arg(long)]
    pub save_defaults: bool,
}

#[derive(Debug, Subcommand)]
pub enum DefaultsAction {
    /// Show the defaults of a calendar
    Show {
        /// Calendar ID (defaults to the last one used, then `primary`)
        #[arg(long)]
        calendar: Option<String>,
    },

    /// Set one default (field: title, duration or reminder)
    Set {
        #[arg(long)]
        calendar: String,
        field: String,
        value: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
