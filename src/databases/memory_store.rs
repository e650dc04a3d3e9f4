use std::collections::HashMap;
use std::sync::RwLock;

use crate::codec;
use crate::errors::{ConfigMigrateError, ConfigMigrateResult};
use crate::location::ConfigurationLocation;
use crate::payload::StoredConfiguration;
use crate::traits::store::ConfigurationStore;

/// In-process configuration store.
///
/// Slots hold the same framed bytes a persistent backend would, so legacy
/// payloads can be seeded with [`insert_raw`](Self::insert_raw) and the effect
/// of normalization is visible through [`raw`](Self::raw).
#[derive(Debug, Default)]
pub struct MemoryConfigurationStore {
    slots: RwLock<HashMap<ConfigurationLocation, Vec<u8>>>,
}

impl MemoryConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(
        &self,
        location: &ConfigurationLocation,
        bytes: impl Into<Vec<u8>>,
    ) -> ConfigMigrateResult<()> {
        self.slots
            .write()
            .map_err(|_| poisoned())?
            .insert(location.clone(), bytes.into());
        Ok(())
    }

    pub fn raw(&self, location: &ConfigurationLocation) -> ConfigMigrateResult<Option<Vec<u8>>> {
        Ok(self
            .slots
            .read()
            .map_err(|_| poisoned())?
            .get(location)
            .cloned())
    }

    /// Occupied slots, sorted.
    pub fn locations(&self) -> ConfigMigrateResult<Vec<ConfigurationLocation>> {
        let mut locations: Vec<_> = self
            .slots
            .read()
            .map_err(|_| poisoned())?
            .keys()
            .cloned()
            .collect();
        locations.sort();
        Ok(locations)
    }

    pub fn len(&self) -> usize {
        self.slots.read().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> ConfigMigrateError {
    ConfigMigrateError::Storage("memory store lock poisoned".into())
}

impl ConfigurationStore for MemoryConfigurationStore {
    fn try_read(
        &self,
        location: &ConfigurationLocation,
    ) -> ConfigMigrateResult<Option<StoredConfiguration>> {
        match self.raw(location)? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(
        &self,
        location: &ConfigurationLocation,
        stored: &StoredConfiguration,
    ) -> ConfigMigrateResult<()> {
        self.insert_raw(location, codec::encode(stored)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;
    use crate::version::Version;

    #[test]
    fn test_empty_slot_reads_as_none() {
        let store = MemoryConfigurationStore::new();
        let loc = ConfigurationLocation::local("app", "missing");
        assert!(store.try_read(&loc).unwrap().is_none());
        assert!(store.read_version(&loc).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_replaces_slot() {
        let store = MemoryConfigurationStore::new();
        let loc = ConfigurationLocation::local("app", "settings");

        let first = StoredConfiguration::new(Version::new(1, 0), Payload::parse("1").unwrap());
        let second = StoredConfiguration::new(Version::new(2, 0), Payload::parse("2").unwrap());
        store.write(&loc, &first).unwrap();
        store.write(&loc, &second).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.try_read(&loc).unwrap(), Some(second));
    }

    #[test]
    fn test_legacy_bytes_read_at_version_zero() {
        let store = MemoryConfigurationStore::new();
        let loc = ConfigurationLocation::local("app", "settings");
        store.insert_raw(&loc, r#"{"volume":3}"#).unwrap();

        let stored = store.try_read(&loc).unwrap().unwrap();
        assert_eq!(stored.version, Version::ZERO);
        assert_eq!(stored.payload, Payload::parse(r#"{"volume":3}"#).unwrap());
    }
}
