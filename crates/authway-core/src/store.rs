//! Token storage and retrieval.
//!
//! Stores the credential pair in `<home>/tokens.json` with restricted
//! permissions (0600). Tokens are never logged or displayed in full.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Store key for the short-lived access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Store key for the long-lived refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key-value persistence for the credential pair.
///
/// The gateway reads through this on every request and writes through it on
/// renewal, so implementations must be safe to share across concurrent calls.
pub trait TokenStore: Send + Sync {
    /// Gets the value for a key.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Sets the value for a key.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes every stored value.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn clear(&self) -> Result<()>;
}

/// File-backed token store.
///
/// The file holds a flat JSON object keyed by the store key names, so a
/// logged-in session looks like
/// `{"access_token": "...", "refresh_token": "..."}`.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }

    /// Creates a store at the default location under the authway home.
    pub fn open_default() -> Self {
        Self::new(crate::config::paths::tokens_path())
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Loads the token file from disk.
    /// Returns an empty map if the file doesn't exist.
    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token store from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse token store from {}", self.path.display()))
    }

    /// Saves the token file to disk with restricted permissions (0600).
    fn save(&self, tokens: &BTreeMap<String, String>) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(tokens).context("Failed to serialize token store")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut tokens = self.load()?;
        tokens.insert(key.to_string(), value.to_string());
        self.save(&tokens)
    }

    fn clear(&self) -> Result<()> {
        self.save(&BTreeMap::new())
    }
}

/// In-memory token store.
///
/// Drop-in replacement for [`FileTokenStore`] where persistence across
/// processes is not wanted, e.g. throwaway sessions and tests.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let tokens = self
            .tokens
            .lock()
            .map_err(|_| anyhow::anyhow!("token store lock poisoned"))?;
        Ok(tokens.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|_| anyhow::anyhow!("token store lock poisoned"))?;
        tokens.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|_| anyhow::anyhow!("token store lock poisoned"))?;
        tokens.clear();
        Ok(())
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}
