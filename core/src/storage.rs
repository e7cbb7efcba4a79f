use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use crate::errors::StoreError;

pub const DIARY_KEY: &str = "plant_diary";
pub const THEME_KEY: &str = "plant_theme";
pub const API_KEY_OVERRIDE_KEY: &str = "plant_triage_api_key";
pub const NOTIFICATIONS_KEY: &str = "plant_notifications";

const PREFERENCES_TREE: &str = "preferences";

/// Local key-value medium backing the diary and the preferences.
///
/// Every value lives under a single key and is replaced as a whole, so a
/// write is one `insert` followed by a flush.
#[derive(Clone)]
pub struct Store {
    db: sled::Db,
    tree: sled::Tree,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        tracing::debug!(path = %path.display(), "Opening local store");
        Self::from_db(sled::open(path)?)
    }

    /// Store that disappears when the last handle is dropped.
    pub fn temporary() -> Result<Self, StoreError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree(PREFERENCES_TREE)?;
        Ok(Self { db, tree })
    }

    pub fn get_str(&self, key: &'static str) -> Result<Option<String>, StoreError> {
        match self.tree.get(key)? {
            Some(buf) => String::from_utf8(buf.to_vec())
                .map(Some)
                .map_err(|_| StoreError::NotText(key)),
            None => Ok(None),
        }
    }

    pub fn put_str(&self, key: &'static str, value: &str) -> Result<(), StoreError> {
        self.tree.insert(key, value.as_bytes())?;
        self.flush()
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, StoreError> {
        match self.tree.get(key)? {
            Some(ref buf) => serde_json::from_slice(buf)
                .map(Some)
                .map_err(|e| StoreError::Corrupt(key, e)),
            None => Ok(None),
        }
    }

    #[instrument(name = "store-write", skip(self, value))]
    pub fn put_json<T: Serialize + ?Sized>(
        &self,
        key: &'static str,
        value: &T,
    ) -> Result<(), StoreError> {
        let buf = serde_json::to_vec(value).map_err(|e| StoreError::Serialize(key, e))?;
        tracing::trace!(bytes = buf.len(), "Replacing stored value");
        self.tree.insert(key, buf)?;
        self.flush()
    }

    pub fn remove(&self, key: &'static str) -> Result<(), StoreError> {
        self.tree.remove(key)?;
        self.flush()
    }

    #[cfg(test)]
    pub(crate) fn put_bytes(&self, key: &'static str, value: &[u8]) -> Result<(), StoreError> {
        self.tree.insert(key, value)?;
        self.flush()
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}
