//! # Config Migrate
//!
//! A versioned configuration migration engine for long-lived applications.
//! Persisted configuration is carried forward to the shape the running code
//! declares, across any number of releases, without manual intervention.
//!
//! ## Features
//!
//! - **Declared Rules**: Configuration types declare their version, storage
//!   slot, previous version and migration methods; no runtime reflection
//! - **Path Resolution**: Direct upgrade rules win; otherwise a multi-hop chain
//!   is searched with cycle detection
//! - **Best-Effort Execution**: A failing rule is logged and skipped, the rest
//!   of the path still runs
//! - **Normalization**: Storage always ends in the latest serialization shape
//! - **Pluggable Storage**: In-memory and sled backends behind one trait
//!
//! ## Quick Start
//!
//! ```rust
//! use config_migrate::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct SettingsV1 {
//!     name: String,
//! }
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct SettingsV2 {
//!     first_name: String,
//!     last_name: String,
//! }
//!
//! impl Configuration for SettingsV1 {
//!     const TYPE_KEY: &'static str = "settings.v1";
//!     const VERSION: Option<Version> = Some(Version::new(1, 0));
//!
//!     fn location() -> ConfigurationLocation {
//!         ConfigurationLocation::local("app", "settings")
//!     }
//! }
//!
//! impl MigrateFrom<SettingsV1> for SettingsV2 {
//!     fn migrate_from(old: SettingsV1) -> Self {
//!         let (first, last) = old.name.split_once(' ').unwrap_or((old.name.as_str(), ""));
//!         SettingsV2 { first_name: first.into(), last_name: last.into() }
//!     }
//! }
//!
//! impl Configuration for SettingsV2 {
//!     const TYPE_KEY: &'static str = "settings.v2";
//!     const VERSION: Option<Version> = Some(Version::new(2, 0));
//!
//!     fn location() -> ConfigurationLocation {
//!         ConfigurationLocation::local("app", "settings")
//!     }
//!
//!     fn previous() -> Option<TypeKey> {
//!         Some(TypeKey::of::<SettingsV1>())
//!     }
//!
//!     fn migrations() -> Vec<MigrationMethod> {
//!         vec![MigrationMethod::upgrade::<SettingsV1, SettingsV2>("from_v1")]
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_type::<SettingsV1>();
//! registry.register_type::<SettingsV2>();
//!
//! let store = MemoryConfigurationStore::new();
//! let old = SettingsV1 { name: "Ada Lovelace".into() };
//! store
//!     .write(
//!         &SettingsV1::location(),
//!         &StoredConfiguration::new(Version::new(1, 0), Payload::from_value(&old).unwrap()),
//!     )
//!     .unwrap();
//!
//! let engine = MigrationEngine::new(store, MemoryLogger::new());
//! let report = engine.upgrade::<SettingsV2, _>(&registry).unwrap();
//! assert_eq!(report.applied(), 1);
//!
//! let stored = engine.store().try_read(&SettingsV2::location()).unwrap().unwrap();
//! assert_eq!(stored.version, Version::new(2, 0));
//! assert_eq!(
//!     stored.payload.to_value::<SettingsV2>().unwrap(),
//!     SettingsV2 { first_name: "Ada".into(), last_name: "Lovelace".into() }
//! );
//! ```

pub mod codec;
pub mod config;
pub mod databases;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod graph;
pub mod location;
pub mod logging;
pub mod payload;
pub mod prelude;
pub mod resolver;
pub mod rule;
pub mod traits;
pub mod version;
