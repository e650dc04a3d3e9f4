//! Configuration for the migration engine and its storage backends.
//!
//! This module provides builder-style configuration via `typed-builder`.

use std::path::PathBuf;
use typed_builder::TypedBuilder;

/// Options controlling a migration run.
///
/// # Examples
///
/// ```
/// use config_migrate::config::MigrationOptions;
///
/// // Defaults: apply rules and normalize
/// let options = MigrationOptions::default();
/// assert!(!options.dry_run);
/// assert!(options.normalize);
///
/// // Only report what would run
/// let options = MigrationOptions::builder().dry_run(true).build();
/// assert!(options.dry_run);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct MigrationOptions {
    /// Resolve and report the path without reading payloads or writing.
    #[builder(default = false)]
    pub dry_run: bool,

    /// Rewrite the stored payload in the live shape after the path has run.
    #[builder(default = true)]
    pub normalize: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            normalize: true,
        }
    }
}

/// Configuration for the sled-backed configuration store.
///
/// # Examples
///
/// ```
/// use config_migrate::config::SledStoreConfig;
///
/// // Create with defaults
/// let config = SledStoreConfig::builder()
///     .path("settings.db")
///     .build();
/// assert!(config.flush_on_write);
///
/// // Customize options
/// let config = SledStoreConfig::builder()
///     .path("/var/lib/app/settings.db")
///     .cache_capacity_bytes(16 * 1024 * 1024)
///     .flush_on_write(false)
///     .build();
/// assert_eq!(config.cache_capacity_bytes, 16 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct SledStoreConfig {
    /// Path to the database directory
    #[builder(setter(into))]
    pub path: PathBuf,

    /// Page cache size in bytes
    #[builder(default = 8 * 1024 * 1024)]
    pub cache_capacity_bytes: u64,

    /// Remove the database when the store is dropped
    #[builder(default = false)]
    pub temporary: bool,

    /// Flush to disk after every write (may impact performance)
    #[builder(default = true)]
    pub flush_on_write: bool,
}

impl SledStoreConfig {
    /// Create a basic configuration with just a path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            cache_capacity_bytes: 8 * 1024 * 1024,
            temporary: false,
            flush_on_write: true,
        }
    }
}
