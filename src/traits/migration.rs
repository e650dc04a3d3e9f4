//! Core traits for declaring versioned configuration types.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::discovery::{MigrationMethod, TypeKey};
use crate::location::ConfigurationLocation;
use crate::version::Version;

/// Trait for upgrading from an older configuration version to a newer one.
///
/// Implement this trait to define how a configuration migrates forward from an
/// older shape, then declare it with
/// [`MigrationMethod::upgrade`](crate::discovery::MigrationMethod::upgrade).
/// The engine chains these conversions when the stored version is several
/// steps behind.
///
/// # Example
///
/// ```
/// use config_migrate::traits::migration::MigrateFrom;
///
/// struct SettingsV1 {
///     name: String,
/// }
///
/// struct SettingsV2 {
///     first_name: String,
///     last_name: String,
/// }
///
/// impl MigrateFrom<SettingsV1> for SettingsV2 {
///     fn migrate_from(old: SettingsV1) -> Self {
///         let mut parts = old.name.split_whitespace();
///         SettingsV2 {
///             first_name: parts.next().unwrap_or_default().to_string(),
///             last_name: parts.next().unwrap_or_default().to_string(),
///         }
///     }
/// }
///
/// let v2 = SettingsV2::migrate_from(SettingsV1 { name: "Ada Lovelace".into() });
/// assert_eq!(v2.first_name, "Ada");
/// assert_eq!(v2.last_name, "Lovelace");
/// ```
pub trait MigrateFrom<OldVersion>: Sized {
    /// Convert from an older version to this version.
    fn migrate_from(old: OldVersion) -> Self;
}

/// A configuration type whose shape is versioned and persisted.
///
/// Implementations replace attribute scanning: the associated items are the
/// declared metadata rule discovery walks. Register the type with
/// [`TypeRegistry::register_type`](crate::discovery::TypeRegistry::register_type).
///
/// # Example
///
/// ```
/// use config_migrate::prelude::*;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct WindowV1 {
///     width: u32,
/// }
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct WindowV2 {
///     width: u32,
///     height: u32,
/// }
///
/// impl Configuration for WindowV1 {
///     const TYPE_KEY: &'static str = "window.v1";
///     const VERSION: Option<Version> = Some(Version::new(1, 0));
///
///     fn location() -> ConfigurationLocation {
///         ConfigurationLocation::local("ui", "window")
///     }
/// }
///
/// impl MigrateFrom<WindowV1> for WindowV2 {
///     fn migrate_from(old: WindowV1) -> Self {
///         WindowV2 { width: old.width, height: old.width * 3 / 4 }
///     }
/// }
///
/// impl Configuration for WindowV2 {
///     const TYPE_KEY: &'static str = "window.v2";
///     const VERSION: Option<Version> = Some(Version::new(2, 0));
///
///     fn location() -> ConfigurationLocation {
///         ConfigurationLocation::local("ui", "window")
///     }
///
///     fn previous() -> Option<TypeKey> {
///         Some(TypeKey::of::<WindowV1>())
///     }
///
///     fn migrations() -> Vec<MigrationMethod> {
///         vec![MigrationMethod::upgrade::<WindowV1, WindowV2>("from_v1")]
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register_type::<WindowV1>();
/// registry.register_type::<WindowV2>();
/// assert_eq!(registry.len(), 2);
/// ```
pub trait Configuration: Serialize + DeserializeOwned + Default + 'static {
    /// Stable identity of the type, used as the discovery visited-set key.
    const TYPE_KEY: &'static str;

    /// Declared version; `None` means the type leaves the target to the rules.
    const VERSION: Option<Version>;

    /// Slot this version of the configuration is persisted in.
    fn location() -> ConfigurationLocation;

    /// The type describing the previous version, if any.
    fn previous() -> Option<TypeKey> {
        None
    }

    /// Migration methods declared on this type.
    fn migrations() -> Vec<MigrationMethod> {
        Vec::new()
    }

    /// Other configuration types to walk during discovery.
    fn references() -> Vec<TypeKey> {
        Vec::new()
    }
}
