//! Client error types.

use std::fmt;

use multievent_core::ValidationError;
use multievent_providers::ProviderError;

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors reported by a command. `main` prints them and exits non-zero.
#[derive(Debug)]
pub enum ClientError {
    /// Bad or missing configuration.
    Config(String),
    /// The form was rejected before anything was sent.
    Validation(ValidationError),
    /// A calendar API or sign-in call failed.
    Provider(ProviderError),
    /// Some events of a batch were not created.
    Submission(String),
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Validation(err) => write!(f, "invalid input: {}", err),
            Self::Provider(err) if err.is_unauthorized() => write!(
                f,
                "{} (run `multievent auth google` to sign in again)",
                err
            ),
            Self::Provider(err) => write!(f, "{}", err),
            Self::Submission(msg) => write!(f, "{}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Provider(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}
