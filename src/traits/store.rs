//! Storage provider trait for versioned configuration payloads.

use crate::errors::ConfigMigrateResult;
use crate::location::ConfigurationLocation;
use crate::payload::StoredConfiguration;
use crate::version::Version;

/// Key/value storage for versioned configuration payloads.
///
/// This trait provides the only two operations the migration engine needs from
/// a persistence backend. It is implemented by
/// [`MemoryConfigurationStore`](crate::databases::memory_store::MemoryConfigurationStore)
/// and, with the `sled` feature,
/// [`SledConfigurationStore`](crate::databases::sled_store::SledConfigurationStore).
///
/// # Implementation Notes
///
/// - `try_read` returns `Ok(None)` for an empty slot; `Err` is reserved for
///   backend or decoding failures.
/// - `write` replaces the slot wholesale and must persist the version together
///   with the payload.
/// - Calls are blocking; the engine never issues two at once.
pub trait ConfigurationStore {
    /// Read the payload and its version from a slot, if present.
    fn try_read(
        &self,
        location: &ConfigurationLocation,
    ) -> ConfigMigrateResult<Option<StoredConfiguration>>;

    /// Write a payload and its version to a slot.
    fn write(
        &self,
        location: &ConfigurationLocation,
        stored: &StoredConfiguration,
    ) -> ConfigMigrateResult<()>;

    /// Version recorded at a slot, if present.
    fn read_version(&self, location: &ConfigurationLocation) -> ConfigMigrateResult<Option<Version>> {
        Ok(self.try_read(location)?.map(|stored| stored.version))
    }
}

impl<S: ConfigurationStore + ?Sized> ConfigurationStore for &S {
    fn try_read(
        &self,
        location: &ConfigurationLocation,
    ) -> ConfigMigrateResult<Option<StoredConfiguration>> {
        (**self).try_read(location)
    }

    fn write(
        &self,
        location: &ConfigurationLocation,
        stored: &StoredConfiguration,
    ) -> ConfigMigrateResult<()> {
        (**self).write(location, stored)
    }
}
