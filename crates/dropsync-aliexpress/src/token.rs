//! OAuth token lifecycle for the vendor gateway.
//!
//! Tokens are persisted through the [`TokenStore`] trait so the manager can
//! be tested against an in-memory store; production uses [`FileTokenStore`],
//! which rewrites the whole file atomically (temp file + rename) on every
//! refresh.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Safety buffer applied when evaluating access-token validity, so a token
/// that expires mid-request is treated as already expired.
pub const ACCESS_EXPIRY_BUFFER_SECS: i64 = 300;

/// Persisted OAuth token pair with absolute expiry timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Authorization state derived from a token record and the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token record exists; the consent step has never completed.
    Unauthorized,
    /// The access token is usable (with the expiry buffer applied).
    AccessValid,
    /// The access token has expired but the refresh token is still good.
    AccessExpiredRefreshValid,
    /// Both tokens are expired; only a human re-authorization helps.
    AllExpired,
}

impl OAuthTokens {
    /// Evaluate the state of this record at `now`.
    ///
    /// The access token is considered expired [`ACCESS_EXPIRY_BUFFER_SECS`]
    /// before its actual expiry.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        let buffer = Duration::seconds(ACCESS_EXPIRY_BUFFER_SECS);
        if self.access_expires_at - buffer > now {
            TokenState::AccessValid
        } else if self.refresh_expires_at > now {
            TokenState::AccessExpiredRefreshValid
        } else {
            TokenState::AllExpired
        }
    }

    /// Evaluate the state of this record right now.
    #[must_use]
    pub fn state(&self) -> TokenState {
        self.state_at(Utc::now())
    }
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("failed to read token file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write token file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {path} is malformed: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistence boundary for OAuth tokens.
///
/// `load` returns `Ok(None)` when no record has ever been saved; that maps
/// to [`TokenState::Unauthorized`].
pub trait TokenStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] if the backing storage cannot be read or
    /// holds a malformed record.
    fn load(&self) -> Result<Option<OAuthTokens>, TokenStoreError>;

    /// # Errors
    ///
    /// Returns [`TokenStoreError`] if the record cannot be persisted.
    fn save(&self, tokens: &OAuthTokens) -> Result<(), TokenStoreError>;
}

/// JSON-on-disk token store.
///
/// Saves rewrite the whole file: the record is serialized to a sibling
/// `.tmp` file and renamed over the target, so a crash mid-write never
/// leaves a half-written token file behind.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<OAuthTokens>, TokenStoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TokenStoreError::Read {
                    path: self.path.display().to_string(),
                    source: e,
                })
            }
        };

        let tokens =
            serde_json::from_str(&content).map_err(|e| TokenStoreError::Malformed {
                path: self.path.display().to_string(),
                source: e,
            })?;
        Ok(Some(tokens))
    }

    fn save(&self, tokens: &OAuthTokens) -> Result<(), TokenStoreError> {
        let write_err = |source| TokenStoreError::Write {
            path: self.path.display().to_string(),
            source,
        };

        let body = serde_json::to_vec_pretty(tokens).map_err(|e| TokenStoreError::Write {
            path: self.path.display().to_string(),
            source: std::io::Error::other(e),
        })?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, body).map_err(write_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(write_err)?;
        Ok(())
    }
}

/// In-memory token store for tests and one-shot tooling.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<OAuthTokens>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new(initial: Option<OAuthTokens>) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<OAuthTokens>, TokenStoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, tokens: &OAuthTokens) -> Result<(), TokenStoreError> {
        *self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(tokens.clone());
        Ok(())
    }
}
