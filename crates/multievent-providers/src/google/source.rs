//! Google token source: cached tokens, refresh, and interactive sign-in.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{Credential, TokenSource};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::BoxFuture;

use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenStorage;

/// Serves Google access tokens from the token file.
///
/// A silent request returns the cached token while it is valid and
/// otherwise redeems the refresh token. An interactive request runs the
/// browser sign-in. A token the API rejected is marked expired, so the next
/// silent request refreshes it.
pub struct GoogleTokenSource {
    config: GoogleConfig,
    storage: TokenStorage,
    oauth: OAuthClient,
    /// Held while a refresh or sign-in is in flight.
    renewing: Mutex<()>,
}

impl GoogleTokenSource {
    /// Validates `config` and loads any saved tokens.
    ///
    /// An unreadable token file is logged and treated as signed out.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate()?;

        let storage = TokenStorage::new(&config.token_path);
        if let Err(e) = storage.load() {
            warn!("ignoring unreadable token file: {}", e);
        }
        let oauth = OAuthClient::new(config.credentials.clone(), config.timeout)?;

        Ok(Self {
            config,
            storage,
            oauth,
            renewing: Mutex::new(()),
        })
    }

    /// Returns true if there are no tokens covering the configured scopes.
    pub fn needs_reauth(&self) -> bool {
        self.storage.needs_reauth(&self.config.scopes)
    }

    pub fn storage(&self) -> &TokenStorage {
        &self.storage
    }

    /// Runs the browser sign-in and stores the result.
    pub async fn sign_in(&self) -> ProviderResult<Credential> {
        let _guard = self.renewing.lock().await;
        let tokens = self
            .oauth
            .authorize(&self.config.scopes, self.config.loopback_port_range)
            .await?;
        let credential = Credential::new(tokens.access_token.clone());
        self.storage.set(tokens)?;
        info!("saved Google tokens to {:?}", self.storage.path());
        Ok(credential)
    }

    /// Deletes the saved tokens.
    pub fn sign_out(&self) -> ProviderResult<()> {
        self.storage.clear()
    }

    async fn silent_token(&self) -> ProviderResult<Credential> {
        if let Some(token) = self.storage.valid_access_token(&self.config.scopes) {
            return Ok(Credential::new(token));
        }

        let _guard = self.renewing.lock().await;
        // Another task may have refreshed while we waited.
        if let Some(token) = self.storage.valid_access_token(&self.config.scopes) {
            return Ok(Credential::new(token));
        }

        let refresh_token = self.storage.refresh_token(&self.config.scopes).ok_or_else(|| {
            ProviderError::authentication("not signed in to Google").with_provider("google")
        })?;

        debug!("access token expired, refreshing");
        let (access_token, expires_in) = self
            .oauth
            .refresh_token(&refresh_token)
            .await
            .map_err(|e| e.with_provider("google"))?;
        self.storage.update_access_token(access_token.clone(), expires_in)?;
        Ok(Credential::new(access_token))
    }
}

impl TokenSource for GoogleTokenSource {
    fn get_token(&self, interactive: bool) -> BoxFuture<'_, ProviderResult<Credential>> {
        Box::pin(async move {
            if interactive {
                self.sign_in().await
            } else {
                self.silent_token().await
            }
        })
    }

    fn remove_cached_token<'a>(&'a self, token: &'a Credential) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.storage.invalidate_access_token(token.as_str())?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::config::OAuthCredentials;
    use crate::google::tokens::TokenInfo;

    fn config(dir: &tempfile::TempDir) -> GoogleConfig {
        GoogleConfig::new(OAuthCredentials::new(
            "test.apps.googleusercontent.com",
            "secret",
        ))
        .with_token_path(dir.path().join("tokens.json"))
    }

    fn seed(config: &GoogleConfig, tokens: TokenInfo) {
        TokenStorage::new(&config.token_path).set(tokens).unwrap();
    }

    #[tokio::test]
    async fn cached_token_served_silently() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        seed(
            &config,
            TokenInfo::new("cached", Some("refresh".into()), Some(3600), config.scopes.clone()),
        );

        let source = GoogleTokenSource::new(config).unwrap();
        assert!(!source.needs_reauth());
        let credential = source.get_token(false).await.unwrap();
        assert_eq!(credential.as_str(), "cached");
    }

    #[tokio::test]
    async fn signed_out_fails_silently() {
        let dir = tempfile::tempdir().unwrap();
        let source = GoogleTokenSource::new(config(&dir)).unwrap();

        assert!(source.needs_reauth());
        let err = source.get_token(false).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.provider(), Some("google"));
    }

    #[tokio::test]
    async fn removed_token_not_served_again() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        // No refresh token, so nothing can replace the removed one silently.
        seed(&config, TokenInfo::new("rejected", None, Some(3600), config.scopes.clone()));

        let source = GoogleTokenSource::new(config).unwrap();
        let credential = source.get_token(false).await.unwrap();
        source.remove_cached_token(&credential).await.unwrap();

        let err = source.get_token(false).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn removing_unknown_token_keeps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        seed(&config, TokenInfo::new("current", None, Some(3600), config.scopes.clone()));

        let source = GoogleTokenSource::new(config).unwrap();
        source
            .remove_cached_token(&Credential::new("stale"))
            .await
            .unwrap();
        assert_eq!(source.get_token(false).await.unwrap().as_str(), "current");
    }

    #[test]
    fn corrupt_token_file_means_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        std::fs::write(&config.token_path, "{ not json").unwrap();

        let source = GoogleTokenSource::new(config).unwrap();
        assert!(source.needs_reauth());
    }

    #[test]
    fn sign_out_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        seed(&config, TokenInfo::new("t", None, None, config.scopes.clone()));
        let path = config.token_path.clone();

        let source = GoogleTokenSource::new(config).unwrap();
        source.sign_out().unwrap();
        assert!(!path.exists());
        assert!(source.needs_reauth());
    }

    #[test]
    fn invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir).with_scopes(vec![]);
        assert!(GoogleTokenSource::new(config).is_err());
    }
}
