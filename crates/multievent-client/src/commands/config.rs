//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the configuration in effect to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    println!("# config.toml ({})", path.display());
    println!("{}", to_toml(config)?);
    Ok(())
}

fn to_toml(config: &ClientConfig) -> ClientResult<String> {
    toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    #[cfg(feature = "google")]
    if let Some(ref google) = config.google {
        if google.client_id.is_some() || google.client_secret.is_some() {
            google
                .to_provider_config()
                .map_err(|e| ClientError::Config(format!("invalid Google settings: {}", e)))?;
            println!("Google settings are valid.");
        } else {
            println!("No Google credentials configured; run `multievent auth google`.");
        }
    }

    if let Some(ref state) = config.storage.state_path
        && state.is_dir()
    {
        return Err(ClientError::Config(format!(
            "state_path {} is a directory",
            state.display()
        )));
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration, state and token file paths.
pub fn path(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    println!("state:  {}", config.state_path().display());
    #[cfg(feature = "google")]
    {
        let tokens = config
            .google
            .as_ref()
            .and_then(|g| g.token_path.clone())
            .unwrap_or_else(multievent_providers::google::GoogleConfig::default_token_path);
        println!("tokens: {}", tokens.display());
    }
    Ok(())
}
