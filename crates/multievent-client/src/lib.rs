//! CLI, configuration, local state and output rendering
//!
//! This crate provides the `multievent` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod defaults;
pub mod error;
pub mod output;
pub mod secret;
#[cfg(feature = "google")]
pub mod session;
pub mod store;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use output::OutputMode;
pub use store::{JsonFileStore, KeyValueStore};
