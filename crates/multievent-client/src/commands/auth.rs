//! `multievent auth`: Google sign-in and sign-out.

use std::path::{Path, PathBuf};

use multievent_providers::TokenSource;
use multievent_providers::google::{
    GoogleConfig, GoogleTokenSource, OAuthCredentials, TokenStorage,
};
use tracing::{info, warn};

use crate::config::{ClientConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};

/// Where the OAuth client credentials came from.
#[derive(Debug, PartialEq, Eq)]
enum CredentialSource {
    /// `--client-id`/`--client-secret` or `--credentials-file`.
    Cli,
    /// Already in `config.toml`.
    Config,
}

/// Signs in to Google Calendar.
///
/// Credentials given on the command line are written to `config_path` once
/// sign-in succeeds, so later commands find them.
pub async fn google(
    client_id: Option<String>,
    client_secret: Option<String>,
    credentials_file: Option<PathBuf>,
    force: bool,
    config: &ClientConfig,
    config_path: &Path,
) -> ClientResult<()> {
    let settings = config.google.clone().unwrap_or_default();
    let (credentials, source) =
        resolve_google_credentials(client_id, client_secret, credentials_file, &settings)?;

    let google_config = settings.apply(GoogleConfig::new(credentials.clone()));
    let token_source = GoogleTokenSource::new(google_config)
        .map_err(|e| ClientError::Config(format!("invalid Google settings: {}", e.message())))?;

    if !force && !token_source.needs_reauth() && token_source.get_token(false).await.is_ok() {
        remember_credentials(&credentials, &source, config_path);
        println!("Already signed in to Google Calendar.");
        println!("Use --force to sign in again.");
        return Ok(());
    }

    println!("A browser window will open to authorize access to your calendars.");
    println!("If it does not, open the URL printed below.");
    println!();

    token_source.sign_in().await?;
    remember_credentials(&credentials, &source, config_path);

    info!("Google sign-in complete");
    println!("Signed in. Tokens saved to {}.", token_source.storage().path().display());
    Ok(())
}

/// Deletes the saved Google tokens.
pub fn logout(config: &ClientConfig) -> ClientResult<()> {
    let path = config
        .google
        .as_ref()
        .and_then(|g| g.token_path.clone())
        .unwrap_or_else(GoogleConfig::default_token_path);

    let storage = TokenStorage::new(&path);
    if !path.exists() {
        println!("Not signed in.");
        return Ok(());
    }
    storage.clear()?;
    println!("Signed out; removed {}.", path.display());
    Ok(())
}

fn remember_credentials(credentials: &OAuthCredentials, source: &CredentialSource, path: &Path) {
    if *source == CredentialSource::Config {
        return;
    }
    match save_credentials_to_config(path, credentials) {
        Ok(()) => println!("Credentials saved to {}", path.display()),
        Err(e) => warn!("could not save credentials: {}", e),
    }
}

/// Writes the credentials into the `[google]` table of `path`, keeping the
/// rest of the file (comments included) as it was.
fn save_credentials_to_config(path: &Path, credentials: &OAuthCredentials) -> ClientResult<()> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| ClientError::Config(format!("cannot edit {}: {}", path.display(), e)))?;

    if !doc.contains_table("google") {
        doc["google"] = toml_edit::table();
    }
    let google = doc["google"]
        .as_table_mut()
        .ok_or_else(|| ClientError::Config("`google` in config.toml is not a table".to_string()))?;
    google["client_id"] = toml_edit::value(credentials.client_id.as_str());
    google["client_secret"] = toml_edit::value(credentials.client_secret.as_str());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_string())?;
    Ok(())
}

/// Picks the OAuth client credentials.
///
/// Priority: `--client-id` with `--client-secret`, then
/// `--credentials-file`, then the `[google]` section of `config.toml`.
fn resolve_google_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    settings: &GoogleSettings,
) -> ClientResult<(OAuthCredentials, CredentialSource)> {
    match (cli_client_id, cli_client_secret) {
        (Some(id), Some(secret)) => {
            return Ok((OAuthCredentials::new(id, secret), CredentialSource::Cli));
        }
        (None, None) => {}
        _ => {
            return Err(ClientError::Config(
                "--client-id and --client-secret must be given together".to_string(),
            ));
        }
    }

    if let Some(path) = cli_credentials_file {
        let credentials = OAuthCredentials::from_file(&path).map_err(|e| {
            ClientError::Config(format!(
                "failed to load credentials from {}: {}",
                path.display(),
                e.message()
            ))
        })?;
        return Ok((credentials, CredentialSource::Cli));
    }

    if settings.client_id.is_some() || settings.client_secret.is_some() {
        let credentials = settings.resolve_credentials().map_err(ClientError::Config)?;
        return Ok((credentials, CredentialSource::Config));
    }

    Err(ClientError::Config(format!(
        "Google credentials are required. Provide them with:\n  \
         - client_id and client_secret under [google] in {}\n  \
         - --client-id and --client-secret\n  \
         - --credentials-file (the JSON from Google Cloud Console)\n  \
         - GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET",
        ClientConfig::default_path().display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_settings() -> GoogleSettings {
        GoogleSettings {
            client_id: Some("config-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("config-secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn cli_flags_take_priority() {
        let (creds, source) = resolve_google_credentials(
            Some("cli-id.apps.googleusercontent.com".to_string()),
            Some("cli-secret".to_string()),
            None,
            &config_settings(),
        )
        .unwrap();
        assert_eq!(creds.client_id, "cli-id.apps.googleusercontent.com");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn falls_back_to_config() {
        let (creds, source) =
            resolve_google_credentials(None, None, None, &config_settings()).unwrap();
        assert_eq!(creds.client_secret, "config-secret");
        assert_eq!(source, CredentialSource::Config);
    }

    #[test]
    fn half_given_flags_rejected() {
        assert!(
            resolve_google_credentials(Some("id".to_string()), None, None, &config_settings())
                .is_err()
        );
        assert!(
            resolve_google_credentials(None, Some("secret".to_string()), None, &GoogleSettings::default())
                .is_err()
        );
    }

    #[test]
    fn nothing_configured() {
        let err = resolve_google_credentials(None, None, None, &GoogleSettings::default())
            .unwrap_err();
        assert!(err.to_string().contains("credentials are required"));
    }

    #[test]
    fn credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(
            &path,
            r#"{"installed": {"client_id": "file-id.apps.googleusercontent.com", "client_secret": "file-secret"}}"#,
        )
        .unwrap();

        let (creds, source) =
            resolve_google_credentials(None, None, Some(path), &config_settings()).unwrap();
        assert_eq!(creds.client_id, "file-id.apps.googleusercontent.com");
        assert_eq!(source, CredentialSource::Cli);

        let missing = dir.path().join("missing.json");
        assert!(resolve_google_credentials(None, None, Some(missing), &config_settings()).is_err());
    }

    #[test]
    fn save_keeps_other_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "# my settings\n[logging]\nformat = \"json\"\n\n[google]\ntimeout_secs = 10\n",
        )
        .unwrap();

        let creds = OAuthCredentials::new("saved.apps.googleusercontent.com", "saved-secret");
        save_credentials_to_config(&path, &creds).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# my settings"));

        let config = ClientConfig::load_from(&path).unwrap();
        let google = config.google.unwrap();
        assert_eq!(google.client_id.as_deref(), Some("saved.apps.googleusercontent.com"));
        assert_eq!(google.client_secret.as_deref(), Some("saved-secret"));
        assert_eq!(google.timeout_secs, Some(10));
        assert_eq!(config.logging.format, multievent_core::TracingOutputFormat::Json);
    }

    #[test]
    fn save_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new").join("config.toml");
        let creds = OAuthCredentials::new("n.apps.googleusercontent.com", "s");
        save_credentials_to_config(&path, &creds).unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.google.unwrap().client_secret.as_deref(), Some("s"));
    }

    #[test]
    fn logout_without_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            google: Some(GoogleSettings {
                token_path: Some(dir.path().join("tokens.json")),
                ..Default::default()
            }),
            ..Default::default()
        };
        logout(&config).unwrap();
    }

    #[test]
    fn logout_removes_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{}").unwrap();
        let config = ClientConfig {
            google: Some(GoogleSettings {
                token_path: Some(path.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };
        logout(&config).unwrap();
        assert!(!path.exists());
    }
}
