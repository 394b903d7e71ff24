//! Secret references in `config.toml`.
//!
//! A value of `pass::some/entry` is replaced by the first line of
//! `pass show some/entry`, and `env::NAME` by the environment variable
//! `NAME`. Other values are used verbatim.

use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("failed to run `pass show {entry}`: {reason}")]
    PassFailed { entry: String, reason: String },

    #[error("`pass show {0}` printed nothing")]
    PassEmpty(String),

    #[error("environment variable `{0}` is not set")]
    EnvMissing(String),
}

/// Expands a secret reference, or returns `value` unchanged.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    match value.split_once("::") {
        Some(("pass", entry)) => from_pass(entry),
        Some(("env", var)) => std::env::var(var).map_err(|_| SecretError::EnvMissing(var.to_string())),
        _ => Ok(value.to_string()),
    }
}

fn from_pass(entry: &str) -> Result<String, SecretError> {
    let failed = |reason: String| SecretError::PassFailed {
        entry: entry.to_string(),
        reason,
    };

    let output = Command::new("pass")
        .args(["show", entry])
        .output()
        .map_err(|e| failed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(failed(format!("{}: {}", output.status, stderr.trim())));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| SecretError::PassEmpty(entry.to_string()))
}
