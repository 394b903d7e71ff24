//! Wiring of configuration, token source and API client for one command.

use std::sync::Arc;

use multievent_providers::acquire_credential;
use multievent_providers::google::{GoogleCalendarClient, GoogleTokenSource};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::store::JsonFileStore;

/// Opens the state store configured in `[storage]`.
pub fn open_store(config: &ClientConfig) -> Arc<JsonFileStore> {
    let path = config.state_path();
    debug!("state file: {}", path.display());
    Arc::new(JsonFileStore::new(path))
}

/// Builds a signed-in Calendar API client.
///
/// Uses the saved tokens, refreshing them if needed; with `interactive`
/// set, falls back to the browser sign-in when there are none.
pub async fn connect(config: &ClientConfig, interactive: bool) -> ClientResult<GoogleCalendarClient> {
    let settings = config.google.clone().unwrap_or_default();
    let google_config = settings.to_provider_config().map_err(ClientError::Config)?;

    let source = Arc::new(GoogleTokenSource::new(google_config.clone())?);
    let credential = acquire_credential(source.as_ref(), interactive).await?;

    Ok(GoogleCalendarClient::new(&google_config, credential, source)?)
}
