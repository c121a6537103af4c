//! Session token persistence
//!
//! The access/refresh pair lives behind [`TokenStore`] so the request client
//! never holds a copy across calls; every request reads the current pair
//! fresh. Implementations must make [`TokenStore::set_tokens`] atomic with
//! respect to readers: a failed write leaves either the old pair or no pair.

use crate::ClientError;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Persisted access/refresh token pair.
pub trait TokenStore: Send + Sync {
    /// Current access token, if any
    fn access_token(&self) -> Option<String>;

    /// Current refresh token, if any
    fn refresh_token(&self) -> Option<String>;

    /// Replace both tokens
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] when the pair could not be persisted.
    fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), ClientError>;

    /// Remove both tokens. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] when stored tokens could not be removed.
    fn clear_tokens(&self) -> Result<(), ClientError>;
}

/// On-disk and in-memory representation of the pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

impl StoredTokens {
    fn pair(access: &str, refresh: &str) -> Self {
        Self {
            access: Some(access.to_owned()),
            refresh: Some(refresh.to_owned()),
        }
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<StoredTokens>,
}

impl MemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a pair
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            tokens: RwLock::new(StoredTokens::pair(access, refresh)),
        }
    }

    fn snapshot(&self) -> StoredTokens {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        self.snapshot().access
    }

    fn refresh_token(&self) -> Option<String> {
        self.snapshot().refresh
    }

    fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), ClientError> {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) =
            StoredTokens::pair(access, refresh);
        Ok(())
    }

    fn clear_tokens(&self) -> Result<(), ClientError> {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = StoredTokens::default();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileTokenStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::{ClientError, StoredTokens, TokenStore};
    use std::fs;
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};
    use tracing::{debug, warn};

    /// Durable store backed by a small JSON file.
    ///
    /// Writes go to a sibling temp file that is renamed over the target, so a
    /// reader sees either the old pair or the new one.
    #[derive(Debug, Clone)]
    pub struct FileTokenStore {
        path: PathBuf,
    }

    impl FileTokenStore {
        /// Store tokens at `path`. The file is created on first write.
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        fn load(&self) -> StoredTokens {
            let content = match fs::read_to_string(&self.path) {
                Ok(content) => content,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return StoredTokens::default(),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Failed to read token file");
                    return StoredTokens::default();
                }
            };

            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Ignoring malformed token file");
                StoredTokens::default()
            })
        }

        fn write(&self, tokens: &StoredTokens) -> io::Result<()> {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }

            let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
            tmp_name.push(".tmp");
            let tmp_path = self.path.with_file_name(tmp_name);

            let content = serde_json::to_vec_pretty(tokens)?;
            let mut file = open_private(&tmp_path)?;
            file.write_all(&content)?;
            file.sync_all()?;
            drop(file);

            fs::rename(&tmp_path, &self.path)
        }
    }

    #[cfg(unix)]
    fn open_private(path: &Path) -> io::Result<fs::File> {
        use std::os::unix::fs::OpenOptionsExt;

        fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
    }

    #[cfg(not(unix))]
    fn open_private(path: &Path) -> io::Result<fs::File> {
        fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
    }

    impl TokenStore for FileTokenStore {
        fn access_token(&self) -> Option<String> {
            self.load().access
        }

        fn refresh_token(&self) -> Option<String> {
            self.load().refresh
        }

        fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), ClientError> {
            self.write(&StoredTokens::pair(access, refresh))
                .map_err(|e| storage_error(&self.path, "write", &e))?;
            debug!(path = %self.path.display(), "Stored session tokens");
            Ok(())
        }

        fn clear_tokens(&self) -> Result<(), ClientError> {
            match fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "Cleared session tokens"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(storage_error(&self.path, "remove", &e)),
            }
            Ok(())
        }
    }

    fn storage_error(path: &Path, action: &str, err: &io::Error) -> ClientError {
        warn!(path = %path.display(), error = %err, "Failed to {action} token file");
        ClientError::Storage(format!("failed to {action} {}: {err}", path.display()))
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::LocalStorageTokenStore;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{ClientError, TokenStore};
    use gloo::storage::{LocalStorage, Storage};

    const ACCESS_TOKEN_KEY: &str = "neerorbit_access_token";
    const REFRESH_TOKEN_KEY: &str = "neerorbit_refresh_token";

    /// Browser `localStorage`, scoped to the page origin
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LocalStorageTokenStore;

    impl LocalStorageTokenStore {
        fn get(key: &str) -> Option<String> {
            LocalStorage::raw().get_item(key).ok().flatten()
        }

        fn remove_both() {
            LocalStorage::delete(ACCESS_TOKEN_KEY);
            LocalStorage::delete(REFRESH_TOKEN_KEY);
        }
    }

    impl TokenStore for LocalStorageTokenStore {
        fn access_token(&self) -> Option<String> {
            Self::get(ACCESS_TOKEN_KEY)
        }

        fn refresh_token(&self) -> Option<String> {
            Self::get(REFRESH_TOKEN_KEY)
        }

        fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), ClientError> {
            let storage = LocalStorage::raw();
            if storage.set_item(ACCESS_TOKEN_KEY, access).is_err()
                || storage.set_item(REFRESH_TOKEN_KEY, refresh).is_err()
            {
                // never leave a new access token next to a stale refresh token
                Self::remove_both();
                tracing::warn!("Failed to write session tokens to localStorage");
                return Err(ClientError::Storage(
                    "failed to write session tokens to localStorage".to_owned(),
                ));
            }
            Ok(())
        }

        fn clear_tokens(&self) -> Result<(), ClientError> {
            Self::remove_both();
            Ok(())
        }
    }
}
