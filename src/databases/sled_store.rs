use std::path::Path;

use strum::IntoEnumIterator;

use crate::codec;
use crate::config::SledStoreConfig;
use crate::errors::ConfigMigrateResult;
use crate::location::{ConfigurationLocation, StorageScope};
use crate::payload::StoredConfiguration;
use crate::traits::store::ConfigurationStore;

/// Configuration store backed by a [sled](https://docs.rs/sled) database.
///
/// Each [`StorageScope`] maps to its own sled tree named after the scope;
/// slots are keyed by `namespace/key` inside it and hold the framed payload
/// produced by [`codec::encode`].
///
/// # Examples
///
/// ```
/// use config_migrate::databases::sled_store::SledConfigurationStore;
/// use config_migrate::prelude::*;
///
/// let store = SledConfigurationStore::temp().unwrap();
/// let location = ConfigurationLocation::local("app", "settings");
///
/// let stored = StoredConfiguration::new(Version::new(1, 0), Payload::parse(r#"{"theme":"dark"}"#).unwrap());
/// store.write(&location, &stored).unwrap();
///
/// assert_eq!(store.try_read(&location).unwrap(), Some(stored));
/// ```
pub struct SledConfigurationStore {
    db: sled::Db,
    flush_on_write: bool,
}

impl SledConfigurationStore {
    /// Open a store at the given path with default settings
    pub fn new<P: AsRef<Path>>(path: P) -> ConfigMigrateResult<Self> {
        Self::open(&SledStoreConfig::new(path.as_ref()))
    }

    pub fn open(config: &SledStoreConfig) -> ConfigMigrateResult<Self> {
        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity_bytes)
            .temporary(config.temporary)
            .open()?;
        Ok(Self {
            db,
            flush_on_write: config.flush_on_write,
        })
    }

    /// Create a temporary store (useful for testing)
    pub fn temp() -> ConfigMigrateResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            db,
            flush_on_write: false,
        })
    }

    /// Get direct access to the underlying sled database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    fn tree(&self, scope: StorageScope) -> ConfigMigrateResult<sled::Tree> {
        Ok(self.db.open_tree(scope.as_ref())?)
    }

    /// Store bytes as-is, bypassing the versioned frame. Used to seed legacy
    /// unversioned payloads.
    pub fn insert_raw(
        &self,
        location: &ConfigurationLocation,
        bytes: impl AsRef<[u8]>,
    ) -> ConfigMigrateResult<()> {
        self.tree(location.scope)?
            .insert(location.slot_key(), bytes.as_ref())?;
        Ok(())
    }

    /// Raw bytes stored at a slot.
    pub fn raw(&self, location: &ConfigurationLocation) -> ConfigMigrateResult<Option<Vec<u8>>> {
        Ok(self
            .tree(location.scope)?
            .get(location.slot_key())?
            .map(|bytes| bytes.to_vec()))
    }

    /// Number of occupied slots across all scopes.
    pub fn len(&self) -> ConfigMigrateResult<usize> {
        let mut total = 0;
        for scope in StorageScope::iter() {
            total += self.tree(scope)?.len();
        }
        Ok(total)
    }

    pub fn is_empty(&self) -> ConfigMigrateResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn flush(&self) -> ConfigMigrateResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl ConfigurationStore for SledConfigurationStore {
    fn try_read(
        &self,
        location: &ConfigurationLocation,
    ) -> ConfigMigrateResult<Option<StoredConfiguration>> {
        match self.tree(location.scope)?.get(location.slot_key())? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(
        &self,
        location: &ConfigurationLocation,
        stored: &StoredConfiguration,
    ) -> ConfigMigrateResult<()> {
        let bytes = codec::encode(stored)?;
        self.tree(location.scope)?.insert(location.slot_key(), bytes)?;
        if self.flush_on_write {
            self.db.flush()?;
        }
        Ok(())
    }
}
