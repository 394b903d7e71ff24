//! Subcommand implementations.

pub mod add;
#[cfg(feature = "google")]
pub mod auth;
pub mod calendars;
pub mod config;
pub mod defaults;
