//! multievent CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use multievent_core::{TracingConfig, init_tracing};

use multievent_client::cli::{Cli, Command, ConfigAction, DefaultsAction};
use multievent_client::commands;
use multievent_client::config::ClientConfig;
use multievent_client::error::{ClientError, ClientResult};
use multievent_client::store::{JsonFileStore, KeyValueStore};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli().with_format(config.logging.format)
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match run(cli, config, config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// An explicit `--config` must exist; the default path may be missing.
fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .map_err(ClientError::Config)
}

async fn run(cli: Cli, config: ClientConfig, config_path: PathBuf) -> ClientResult<()> {
    let mode = cli.output_mode();

    match cli.command {
        #[cfg(feature = "google")]
        Command::Auth { action } => match action {
            multievent_client::cli::AuthAction::Google {
                client_id,
                client_secret,
                credentials_file,
                force,
            } => {
                commands::auth::google(
                    client_id,
                    client_secret,
                    credentials_file,
                    force,
                    &config,
                    &config_path,
                )
                .await
            }
            multievent_client::cli::AuthAction::Logout => commands::auth::logout(&config),
        },
        #[cfg(feature = "google")]
        Command::Calendars => commands::calendars::run(&config, mode).await,
        #[cfg(feature = "google")]
        Command::Add(args) => commands::add::run(&config, &args, mode).await,
        Command::Defaults { action } => {
            let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(config.state_path()));
            let output = match action {
                DefaultsAction::Show { calendar } => {
                    commands::defaults::show(store, calendar.as_deref(), mode).await?
                }
                DefaultsAction::Set {
                    calendar,
                    field,
                    value,
                } => commands::defaults::set(store, &calendar, &field, &value).await?,
            };
            println!("{}", output);
            Ok(())
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config, &config_path),
        },
    }
}
