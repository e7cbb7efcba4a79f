use std::sync::Arc;

use crate::errors::{ConfigurationError, StoreError, TriageError};
use crate::storage::{API_KEY_OVERRIDE_KEY, Store};

/// Environment variables consulted for the Gemini key, in order.
pub const API_KEY_VARIABLES: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Where the resolved key came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    Environment(&'static str),
    Stored,
}

/// Resolves the backend credential at call time: environment first, then
/// the override persisted in the local store.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Store,
    env: EnvLookup,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CredentialResolver {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            env: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replaces the process environment lookup.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// A key that is absent everywhere is a configuration error; failing to
    /// read the stored override is a store error.
    pub fn resolve(&self) -> Result<(String, CredentialSource), TriageError> {
        for name in API_KEY_VARIABLES {
            if let Some(key) = non_blank((self.env)(name)) {
                return Ok((key, CredentialSource::Environment(name)));
            }
        }

        let stored = self
            .stored()
            .inspect_err(|e| tracing::warn!("Could not read stored API key: {e}"))?;
        match stored {
            Some(key) => Ok((key, CredentialSource::Stored)),
            None => Err(ConfigurationError::MissingApiKey.into()),
        }
    }

    pub fn stored(&self) -> Result<Option<String>, StoreError> {
        Ok(non_blank(self.store.get_str(API_KEY_OVERRIDE_KEY)?))
    }

    pub fn store_override(&self, key: &str) -> Result<(), StoreError> {
        self.store.put_str(API_KEY_OVERRIDE_KEY, key.trim())
    }

    pub fn clear_override(&self) -> Result<(), StoreError> {
        self.store.remove(API_KEY_OVERRIDE_KEY)
    }
}
