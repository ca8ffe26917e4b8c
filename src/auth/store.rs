use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::auth::token::TokenKey;

/// Storage for the session token pair.
///
/// Reads and writes are single statements with no suspension points, so a
/// single-threaded caller never observes a torn pair. Implementations must
/// tolerate concurrent access from multiple request flows.
pub trait TokenStore: Send + Sync {
    /// Get the stored value for a token, if any.
    fn get(&self, key: TokenKey) -> Option<String>;

    /// Store a value for a token, replacing any previous value.
    fn set(&self, key: TokenKey, value: &str);

    /// Remove the stored value for a token.
    fn remove(&self, key: TokenKey);
}

/// In-memory token store.
///
/// Used by tests and by embedding applications that handle persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<TokenKey, String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a token pair.
    pub fn with_tokens(access_token: &str, refresh_token: &str) -> Self {
        let store = Self::new();
        store.set(TokenKey::AccessToken, access_token);
        store.set(TokenKey::RefreshToken, refresh_token);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: TokenKey) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
            .cloned()
    }

    fn set(&self, key: TokenKey, value: &str) {
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, value.to_string());
    }

    fn remove(&self, key: TokenKey) {
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&key);
    }
}

/// Token file name within the data directory
const TOKEN_FILENAME: &str = "taskhub.tokens.json";

/// File-backed token store.
///
/// Persists the pair as a small JSON document under a data directory, the
/// desktop analogue of browser local storage. A missing or unreadable file
/// is treated as an empty store rather than an error.
pub struct FileTokenStore {
    token_path: PathBuf,
    /// In-memory mirror of the file contents
    cache: RwLock<HashMap<TokenKey, String>>,
}

impl FileTokenStore {
    /// Create a store rooted at the given data directory.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();

        if let Err(e) = fs::create_dir_all(&data_dir) {
            warn!(error = %e, dir = %data_dir.display(), "Failed to create token data directory");
        }

        let token_path = data_dir.join(TOKEN_FILENAME);
        let cache = RwLock::new(Self::load(&token_path));

        Self { token_path, cache }
    }

    /// Load the token map from disk, treating any failure as empty.
    fn load(path: &Path) -> HashMap<TokenKey, String> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => {
                debug!(path = %path.display(), "No token file found, starting empty");
                return HashMap::new();
            }
        };

        let raw: HashMap<String, String> = match serde_json::from_str(&json) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Token file is corrupt, starting empty");
                return HashMap::new();
            }
        };

        let mut tokens = HashMap::new();
        for key in [TokenKey::AccessToken, TokenKey::RefreshToken] {
            if let Some(value) = raw.get(key.as_str()) {
                tokens.insert(key, value.clone());
            }
        }
        tokens
    }

    /// Write the current token map to disk.
    fn persist(&self, tokens: &HashMap<TokenKey, String>) {
        let raw: HashMap<&str, &String> = tokens.iter().map(|(k, v)| (k.as_str(), v)).collect();

        let json = match serde_json::to_string(&raw) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize tokens");
                return;
            }
        };

        if let Err(e) = fs::write(&self.token_path, json) {
            warn!(error = %e, path = %self.token_path.display(), "Failed to write token file");
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: TokenKey) -> Option<String> {
        self.cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
            .cloned()
    }

    fn set(&self, key: TokenKey, value: &str) {
        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.insert(key, value.to_string());
        self.persist(&cache);
    }

    fn remove(&self, key: TokenKey) {
        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.remove(&key);
        self.persist(&cache);
    }
}
