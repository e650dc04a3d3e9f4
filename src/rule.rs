//! Upgrade rules: the edges of the version graph.

use std::fmt;
use std::sync::Arc;

use derive_more::{Deref, From, Into};

use crate::errors::{ConfigMigrateError, ConfigMigrateResult};
use crate::location::ConfigurationLocation;
use crate::payload::Payload;
use crate::version::Version;

/// Opaque payload transformation carried by a rule.
pub type Transform = Arc<dyn Fn(&Payload) -> anyhow::Result<Payload> + Send + Sync>;

/// A directed edge `from -> to` that reads the old payload at `read_from` and
/// writes the transformed payload at `write_to`.
///
/// The two locations may differ, which is how a migration relocates a
/// configuration. Cloning a rule shares its transform.
#[derive(Clone)]
pub struct UpgradeRule {
    from: Version,
    to: Version,
    read_from: ConfigurationLocation,
    write_to: ConfigurationLocation,
    transform: Transform,
    origin: String,
}

impl UpgradeRule {
    /// Create a rule. Fails with [`ConfigMigrateError::InvalidRule`] when
    /// `from == to`.
    pub fn new<F>(
        origin: impl Into<String>,
        from: Version,
        to: Version,
        read_from: ConfigurationLocation,
        write_to: ConfigurationLocation,
        transform: F,
    ) -> ConfigMigrateResult<Self>
    where
        F: Fn(&Payload) -> anyhow::Result<Payload> + Send + Sync + 'static,
    {
        Self::with_transform(origin, from, to, read_from, write_to, Arc::new(transform))
    }

    pub fn with_transform(
        origin: impl Into<String>,
        from: Version,
        to: Version,
        read_from: ConfigurationLocation,
        write_to: ConfigurationLocation,
        transform: Transform,
    ) -> ConfigMigrateResult<Self> {
        let origin = origin.into();
        if from == to {
            return Err(ConfigMigrateError::InvalidRule { origin, from, to });
        }

        Ok(Self {
            from,
            to,
            read_from,
            write_to,
            transform,
            origin,
        })
    }

    pub fn from(&self) -> Version {
        self.from
    }

    pub fn to(&self) -> Version {
        self.to
    }

    /// The `(from, to)` pair identifying this edge in the graph.
    pub fn pair(&self) -> (Version, Version) {
        (self.from, self.to)
    }

    pub fn read_from(&self) -> &ConfigurationLocation {
        &self.read_from
    }

    pub fn write_to(&self) -> &ConfigurationLocation {
        &self.write_to
    }

    /// Human readable declaration site, e.g. `SettingsV2::from_v1`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn apply(&self, payload: &Payload) -> anyhow::Result<Payload> {
        (self.transform)(payload)
    }
}

impl fmt::Debug for UpgradeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradeRule")
            .field("origin", &self.origin)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("read_from", &self.read_from)
            .field("write_to", &self.write_to)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for UpgradeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} -> {})", self.origin, self.from, self.to)
    }
}

/// Ordered rules to execute, oldest-version edge first.
///
/// An empty path means the stored configuration is already current.
#[derive(Debug, Clone, Default, Deref, From, Into)]
pub struct MigrationPath(Vec<UpgradeRule>);

impl MigrationPath {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `(from, to)` of every step, in execution order.
    pub fn pairs(&self) -> Vec<(Version, Version)> {
        self.0.iter().map(UpgradeRule::pair).collect()
    }
}

impl IntoIterator for MigrationPath {
    type Item = UpgradeRule;
    type IntoIter = std::vec::IntoIter<UpgradeRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MigrationPath {
    type Item = &'a UpgradeRule;
    type IntoIter = std::slice::Iter<'a, UpgradeRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
