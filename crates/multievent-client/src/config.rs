//! Client configuration.
//!
//! Settings live in `config.toml`, by default under
//! `~/.config/multievent/`. Every section and key is optional.
//!
//! ```toml
//! [google]
//! client_id = "1234.apps.googleusercontent.com"
//! client_secret = "pass::google/multievent"   # or env::VAR, or plain text
//! timeout_secs = 30
//!
//! [storage]
//! state_path = "/home/me/.local/share/multievent/state.json"
//!
//! [logging]
//! format = "compact"   # pretty | compact | json
//! ```

use std::path::{Path, PathBuf};

use multievent_core::TracingOutputFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[cfg(feature = "google")]
    pub google: Option<GoogleSettings>,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// Where local state is kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// State file holding per-calendar defaults and the last-used calendar.
    pub state_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log line format on stderr.
    pub format: TracingOutputFormat,
}

impl ClientConfig {
    /// Loads the config from the default path; a missing file yields the
    /// defaults.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("multievent")
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("multievent")
    }

    /// The state file, from `[storage]` or `<data dir>/multievent/state.json`.
    pub fn state_path(&self) -> PathBuf {
        self.storage
            .state_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("state.json"))
    }
}

/// The `[google]` section.
///
/// `client_id` and `client_secret` may be secret references
/// (`pass::…`, `env::…`).
#[cfg(feature = "google")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_path: Option<PathBuf>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Calendar API root, for testing against another server.
    pub api_base_url: Option<String>,
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Resolves the credentials and builds the provider configuration.
    pub fn to_provider_config(&self) -> Result<multievent_providers::google::GoogleConfig, String> {
        let credentials = self.resolve_credentials()?;
        let config = self.apply(multievent_providers::google::GoogleConfig::new(credentials));
        config.validate().map_err(|e| e.message().to_string())?;
        Ok(config)
    }

    /// Applies the non-credential settings to `config`.
    pub(crate) fn apply(
        &self,
        mut config: multievent_providers::google::GoogleConfig,
    ) -> multievent_providers::google::GoogleConfig {
        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(std::time::Duration::from_secs(secs));
        }
        if let Some(ref url) = self.api_base_url {
            config = config.with_api_base_url(url);
        }
        config
    }

    /// Expands `client_id` and `client_secret`; both must be set.
    pub(crate) fn resolve_credentials(
        &self,
    ) -> Result<multievent_providers::google::OAuthCredentials, String> {
        use multievent_providers::google::OAuthCredentials;

        let raw_id = self.client_id.as_deref().ok_or_else(|| {
            format!(
                "Google credentials not found. Add to {}:\n  \
                 [google]\n  \
                 client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                 client_secret = \"YOUR_SECRET\"\n\n  \
                 or run: multievent auth google --credentials-file <path>",
                ClientConfig::default_path().display()
            )
        })?;
        let raw_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| "client_secret is missing from the [google] section".to_string())?;

        let client_id = crate::secret::resolve(raw_id)
            .map_err(|e| format!("failed to resolve client_id: {}", e))?;
        let client_secret = crate::secret::resolve(raw_secret)
            .map_err(|e| format!("failed to resolve client_secret: {}", e))?;

        Ok(OAuthCredentials::new(client_id, client_secret))
    }
}
