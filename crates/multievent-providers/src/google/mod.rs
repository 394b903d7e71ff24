//! Google Calendar backend.
//!
//! Users bring their own OAuth client (Google requires a registered
//! application). Sign-in uses the authorization code flow with PKCE and a
//! loopback redirect; tokens are kept in a private JSON file and refreshed
//! without prompting while the refresh token stays valid.
//!
//! ```ignore
//! use std::sync::Arc;
//! use multievent_providers::google::{GoogleCalendarClient, GoogleConfig, GoogleTokenSource, OAuthCredentials};
//! use multievent_providers::{acquire_credential, list_all_calendars, CalendarListOptions};
//!
//! let config = GoogleConfig::new(OAuthCredentials::from_file("credentials.json")?);
//! let source = Arc::new(GoogleTokenSource::new(config.clone())?);
//! let credential = acquire_credential(source.as_ref(), true).await?;
//! let client = GoogleCalendarClient::new(&config, credential, source)?;
//! let calendars = list_all_calendars(&client, CalendarListOptions::writable()).await?;
//! ```

mod client;
mod config;
mod oauth;
mod source;
mod tokens;

pub use client::{GoogleCalendarClient, extract_error_message};
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{OAuthClient, PkceFlow};
pub use source::GoogleTokenSource;
pub use tokens::{TokenInfo, TokenStorage};
