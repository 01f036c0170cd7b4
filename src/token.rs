//! Player token validation and on-disk storage.

use crate::error::TokenError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Length of a token issued by the GROT server.
pub const TOKEN_LENGTH: usize = 36;

/// File name used under the home directory.
pub const TOKEN_FILE_NAME: &str = ".grot_token";

/// Rejects tokens that do not have the issued length.
#[instrument(skip(token))]
pub fn validate_token(token: &str) -> Result<(), TokenError> {
    if token.chars().count() != TOKEN_LENGTH {
        return Err(TokenError::new(format!("Invalid token {}", token)));
    }
    Ok(())
}

/// Token file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at [`TokenStore::default_path`].
    #[instrument]
    pub fn at_default_path() -> Self {
        Self::new(Self::default_path())
    }

    /// Returns the default token file location.
    ///
    /// Resolution order:
    /// 1. `$GROT_TOKEN_FILE` environment variable
    /// 2. `$HOME/.grot_token` (or `%USERPROFILE%\.grot_token`)
    /// 3. `./.grot_token`
    #[instrument]
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("GROT_TOKEN_FILE") {
            debug!(path = %path, "Using GROT_TOKEN_FILE env var");
            return PathBuf::from(path);
        }

        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            return PathBuf::from(home).join(TOKEN_FILE_NAME);
        }

        debug!("No home directory, falling back to working directory");
        PathBuf::from(TOKEN_FILE_NAME)
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validates and writes `token` to the store.
    #[instrument(skip(self, token), fields(path = %self.path.display()))]
    pub fn save(&self, token: &str) -> Result<(), TokenError> {
        validate_token(token)?;
        std::fs::write(&self.path, token).map_err(|e| {
            TokenError::new(format!(
                "Failed to write token file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        info!("Token saved");
        Ok(())
    }

    /// Reads and validates the stored token.
    ///
    /// Trailing whitespace (an editor-added newline, say) is ignored.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<String, TokenError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            TokenError::new(format!(
                "Failed to read token file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let token = content.trim_end().to_string();
        validate_token(&token)?;
        debug!("Token loaded");
        Ok(token)
    }
}
