//! Persisted OAuth tokens.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Tokens are treated as expired this long before Google says they are.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An access token, the refresh token that renews it, and what was granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
    pub last_refresh: DateTime<Utc>,
}

fn expiry_from(expires_in_secs: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in_secs
        .map(|secs| Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_MARGIN_SECS))
}

impl TokenInfo {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expiry_from(expires_in_secs),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// A token without a known expiry never expires.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Replaces the access token after a refresh. The refresh token is kept.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expiry_from(expires_in_secs);
        self.last_refresh = Utc::now();
    }
}

/// File-backed token cache.
///
/// The file is JSON, rewritten through a temp file and rename, and readable
/// only by the owner on Unix.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    tokens: RwLock<Option<TokenInfo>>,
}

impl TokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tokens: RwLock::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<TokenInfo>> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<TokenInfo>> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads the token file into memory. Returns false if there is none.
    pub fn load(&self) -> ProviderResult<bool> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token file: {}", e))
        })?;
        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!("failed to parse token file: {}", e))
        })?;

        debug!("loaded tokens from {:?}", self.path);
        *self.write() = Some(tokens);
        Ok(true)
    }

    fn save(&self, tokens: &TokenInfo) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!("failed to create token directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| ProviderError::internal(format!("failed to serialize tokens: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| {
            ProviderError::configuration(format!("failed to write token file: {}", e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                ProviderError::configuration(format!("failed to restrict token file: {}", e))
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to rename token file: {}", e))
        })?;

        debug!("saved tokens to {:?}", self.path);
        Ok(())
    }

    pub fn get(&self) -> Option<TokenInfo> {
        self.read().clone()
    }

    /// Replaces the cached tokens and writes them to disk.
    pub fn set(&self, tokens: TokenInfo) -> ProviderResult<()> {
        self.save(&tokens)?;
        *self.write() = Some(tokens);
        Ok(())
    }

    /// Stores a refreshed access token, keeping the refresh token.
    pub fn update_access_token(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> ProviderResult<()> {
        let mut guard = self.write();
        let tokens = guard
            .as_mut()
            .ok_or_else(|| ProviderError::internal("no tokens to update"))?;
        tokens.update_access_token(access_token, expires_in_secs);
        self.save(tokens)
    }

    /// Marks `access_token` as expired if it is the cached one.
    ///
    /// The refresh token survives, so the next silent request refreshes
    /// instead of prompting. Returns false if a different token is cached.
    pub fn invalidate_access_token(&self, access_token: &str) -> ProviderResult<bool> {
        let mut guard = self.write();
        let Some(tokens) = guard.as_mut() else {
            return Ok(false);
        };
        if tokens.access_token != access_token {
            debug!("rejected token is no longer cached");
            return Ok(false);
        }

        tokens.expires_at = Some(Utc::now());
        self.save(tokens)?;
        info!("discarded rejected access token");
        Ok(true)
    }

    /// Forgets the tokens in memory and deletes the file.
    pub fn clear(&self) -> ProviderResult<()> {
        *self.write() = None;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ProviderError::configuration(format!("failed to remove token file: {}", e))
            })?;
            info!("removed tokens at {:?}", self.path);
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached access token if it is unexpired and covers `scopes`.
    pub fn valid_access_token(&self, scopes: &[String]) -> Option<String> {
        self.read()
            .as_ref()
            .filter(|t| !t.is_expired() && t.has_scopes(scopes))
            .map(|t| t.access_token.clone())
    }

    /// Returns the refresh token if the cached grant covers `scopes`.
    pub fn refresh_token(&self, scopes: &[String]) -> Option<String> {
        self.read()
            .as_ref()
            .filter(|t| t.has_scopes(scopes))
            .and_then(|t| t.refresh_token.clone())
    }

    /// True when there are no tokens, or they lack one of `required_scopes`.
    pub fn needs_reauth(&self, required_scopes: &[String]) -> bool {
        self.read()
            .as_ref()
            .is_none_or(|t| !t.has_scopes(required_scopes))
    }
}
