use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

/// Keychain service name the tokens are filed under
const SERVICE_NAME: &str = "dailyschool";

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Persistence for the access/refresh token pair.
///
/// Implementations do no validation and track no expiry. An empty stored
/// value reads back as `None`.
pub trait TokenStore: Send + Sync {
    /// Read a raw value by storage key.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw value by storage key.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> Result<()>;

    /// Store both tokens. If the refresh token cannot be written, both
    /// entries are removed so a half-written pair never stays behind.
    fn save(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, access_token)?;
        if let Err(e) = self.set(REFRESH_TOKEN_KEY, refresh_token) {
            if let Err(clear_err) = self.remove() {
                warn!(error = %clear_err, "Failed to roll back partially saved tokens");
            }
            return Err(e);
        }
        Ok(())
    }

    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.get(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// Replace only the access token (used after a refresh).
    fn set_access_token(&self, access_token: &str) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, access_token)
    }

    /// Remove both tokens.
    fn remove(&self) -> Result<()> {
        // Attempt both deletes so one failure does not strand the other token.
        let access = self.delete(ACCESS_TOKEN_KEY);
        let refresh = self.delete(REFRESH_TOKEN_KEY);
        access.and(refresh)
    }
}

/// Tokens kept in the OS keychain, surviving restarts.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Store under a different keychain service (one per API host, for example).
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {} from keychain", key)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .with_context(|| format!("Failed to store {} in keychain", key))
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {} from keychain", key)),
        }
    }
}

/// Process-local token store. Nothing outlives the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token pair.
    pub fn with_tokens(access_token: &str, refresh_token: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(ACCESS_TOKEN_KEY.to_string(), access_token.to_string());
        values.insert(REFRESH_TOKEN_KEY.to_string(), refresh_token.to_string());
        Self {
            values: Mutex::new(values),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
