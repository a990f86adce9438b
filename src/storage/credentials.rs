//! API credential storage in the system keyring
//!
//! The key is kept apart from the state database. Configuration (and the
//! `GEMCHAT_API_KEY` variable folded into it) wins over the keyring entry.

use crate::config::ProviderConfig;
use crate::error::Result;

/// Keyring service name
const KEYRING_SERVICE: &str = "gemchat";
/// Keyring user name for the Gemini API key
const KEYRING_USER: &str = "api_key";

/// Reads and writes the API key in the OS keyring
#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
    user: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE, KEYRING_USER)
    }
}

impl CredentialStore {
    /// Create a store for an explicit keyring service/user pair
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    /// Store the API key
    ///
    /// # Errors
    ///
    /// Returns `GemchatError::Keyring` if the keyring is unavailable
    pub fn store(&self, api_key: &str) -> Result<()> {
        let entry = keyring::Entry::new(&self.service, &self.user)?;
        entry.set_password(api_key.trim())?;
        tracing::info!("Stored API key in keyring ({}/{})", self.service, self.user);
        Ok(())
    }

    /// Read the stored API key, if any
    ///
    /// # Errors
    ///
    /// Returns `GemchatError::Keyring` for keyring failures other than a
    /// missing entry
    pub fn load(&self) -> Result<Option<String>> {
        let entry = keyring::Entry::new(&self.service, &self.user)?;
        match entry.get_password() {
            Ok(key) if key.trim().is_empty() => Ok(None),
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the stored API key (best-effort)
    pub fn clear(&self) -> Result<()> {
        let entry = keyring::Entry::new(&self.service, &self.user)?;
        match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the key to use for requests
    ///
    /// Configuration takes precedence; keyring failures are logged and
    /// treated as "no key", which later surfaces as the missing-key
    /// placeholder in the conversation.
    pub fn resolve(&self, config: &ProviderConfig) -> Option<String> {
        if let Some(key) = config.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using API key from configuration");
            return Some(key.clone());
        }

        match self.load() {
            Ok(Some(key)) => {
                tracing::debug!("Using API key from keyring");
                Some(key)
            }
            Ok(None) => {
                tracing::debug!("No API key stored in keyring");
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read API key from keyring: {}", e);
                None
            }
        }
    }
}
