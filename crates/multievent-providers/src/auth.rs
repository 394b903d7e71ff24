//! Bearer credentials and the source they are obtained from.

use std::fmt;

use tracing::info;

use crate::error::ProviderResult;
use crate::provider::BoxFuture;

/// An opaque bearer token.
///
/// The token text is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for the `Authorization` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Where bearer tokens come from, and where rejected ones are discarded.
///
/// Mirrors an identity provider's token cache: a token can be requested
/// silently or interactively, and a token the server rejected can be removed
/// from the cache so the next request yields a fresh one.
pub trait TokenSource: Send + Sync {
    /// Returns a usable token.
    ///
    /// With `interactive` false this must not prompt the user; it fails with
    /// an authentication error when no token can be obtained silently.
    fn get_token(&self, interactive: bool) -> BoxFuture<'_, ProviderResult<Credential>>;

    /// Discards `token` from the cache. A token that is no longer cached is
    /// ignored.
    fn remove_cached_token<'a>(&'a self, token: &'a Credential) -> BoxFuture<'a, ProviderResult<()>>;
}

/// Obtains a credential, falling back to the interactive flow when the
/// silent one fails and `allow_interactive` is set.
pub async fn acquire_credential(
    source: &dyn TokenSource,
    allow_interactive: bool,
) -> ProviderResult<Credential> {
    match source.get_token(false).await {
        Ok(credential) => Ok(credential),
        Err(err) if allow_interactive && err.is_unauthorized() => {
            info!("no cached credential, starting interactive sign-in");
            source.get_token(true).await
        }
        Err(err) => Err(err),
    }
}
