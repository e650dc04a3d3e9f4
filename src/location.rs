//! Addressable storage slots for configuration payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::ConfigMigrateError;

/// Storage scope a configuration slot lives in.
///
/// Backends map scopes onto their own partitioning: the sled store opens one
/// tree per scope, the memory store simply keys on it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Machine-local settings.
    Local,
    /// Settings that follow the user between machines.
    Roaming,
    /// Settings shared by every user of the application.
    Shared,
}

/// Where one version of a configuration payload is persisted.
///
/// A location is the `(scope, namespace, key)` triple; two locations are equal
/// only when all three components match. It renders as `scope:namespace/key`
/// and parses back from the same form.
///
/// ```
/// use config_migrate::location::{ConfigurationLocation, StorageScope};
///
/// let loc = ConfigurationLocation::new(StorageScope::Roaming, "editor", "settings");
/// assert_eq!(loc.to_string(), "roaming:editor/settings");
/// assert_eq!("roaming:editor/settings".parse::<ConfigurationLocation>().unwrap(), loc);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigurationLocation {
    pub scope: StorageScope,
    pub namespace: String,
    pub key: String,
}

impl ConfigurationLocation {
    pub fn new(scope: StorageScope, namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            scope,
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    pub fn local(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(StorageScope::Local, namespace, key)
    }

    /// Key bytes inside the scope's partition: `namespace/key`.
    pub fn slot_key(&self) -> Vec<u8> {
        format!("{}/{}", self.namespace, self.key).into_bytes()
    }
}

impl fmt::Display for ConfigurationLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.scope, self.namespace, self.key)
    }
}

impl FromStr for ConfigurationLocation {
    type Err = ConfigMigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigMigrateError::InvalidLocation(s.to_string());

        let (scope, rest) = s.split_once(':').ok_or_else(invalid)?;
        let (namespace, key) = rest.split_once('/').ok_or_else(invalid)?;
        if namespace.is_empty() || key.is_empty() {
            return Err(invalid());
        }
        let scope = StorageScope::from_str(scope).map_err(|_| invalid())?;

        Ok(Self::new(scope, namespace, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_requires_all_components() {
        let a = ConfigurationLocation::local("app", "settings");
        assert_eq!(a, ConfigurationLocation::local("app", "settings"));
        assert_ne!(a, ConfigurationLocation::local("app", "layout"));
        assert_ne!(a, ConfigurationLocation::local("other", "settings"));
        assert_ne!(
            a,
            ConfigurationLocation::new(StorageScope::Shared, "app", "settings")
        );
    }

    #[test]
    fn test_parse_rejects_malformed_locations() {
        assert!("app/settings".parse::<ConfigurationLocation>().is_err());
        assert!("local:settings".parse::<ConfigurationLocation>().is_err());
        assert!("cloud:app/settings".parse::<ConfigurationLocation>().is_err());
        assert!("local:/settings".parse::<ConfigurationLocation>().is_err());
    }
}
