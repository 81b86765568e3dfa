//! Secure in-memory credential management for provider bearer keys.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::ProviderError;

/// Bearer key wrapper that zeroes its backing storage on drop and never
/// renders the value through `Debug`.
#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

/// Stores bearer keys per dialect name for callers that manage credentials
/// across several providers instead of inlining them in each config.
#[derive(Default)]
pub struct CredentialStore {
    keys: Mutex<HashMap<String, SecretString>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_api_key(
        &self,
        dialect: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<(), ProviderError> {
        let api_key = SecretString::new(api_key);
        if api_key.is_empty() {
            return Err(ProviderError::authentication("api key must not be empty"));
        }

        self.keys_mut()?.insert(dialect.into(), api_key);
        Ok(())
    }

    pub fn has_api_key(&self, dialect: &str) -> Result<bool, ProviderError> {
        Ok(self.keys_ref()?.contains_key(dialect))
    }

    pub fn api_key(&self, dialect: &str) -> Result<Option<SecretString>, ProviderError> {
        Ok(self.keys_ref()?.get(dialect).cloned())
    }

    pub fn with_api_key<R>(
        &self,
        dialect: &str,
        f: impl FnOnce(&str) -> R,
    ) -> Result<Option<R>, ProviderError> {
        let keys = self.keys_ref()?;
        Ok(keys.get(dialect).map(|secret| f(secret.expose())))
    }

    pub fn clear(&self, dialect: &str) -> Result<bool, ProviderError> {
        Ok(self.keys_mut()?.remove(dialect).is_some())
    }

    fn keys_ref(&self) -> Result<MutexGuard<'_, HashMap<String, SecretString>>, ProviderError> {
        self.keys
            .lock()
            .map_err(|_| ProviderError::other("credential store lock poisoned"))
    }

    fn keys_mut(&self) -> Result<MutexGuard<'_, HashMap<String, SecretString>>, ProviderError> {
        self.keys
            .lock()
            .map_err(|_| ProviderError::other("credential store lock poisoned"))
    }
}
