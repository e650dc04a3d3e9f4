//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits,
//! allowing users to get started quickly with a single import.
//!
//! # Usage
//!
//! ```rust
//! use config_migrate::prelude::*;
//! ```
//!
//! # What's Included
//!
//! ## Declaring Configuration
//!
//! - [`Configuration`]: Trait for versioned configuration structs
//! - [`MigrateFrom`]: Trait for upgrading from older versions
//! - [`ConfigurationType`], [`MigrationMethod`], [`TypeRegistry`]: Explicit
//!   registration of types and their migration methods
//!
//! ## Running Migrations
//!
//! - [`MigrationEngine`]: Discovers, resolves and executes migrations
//! - [`MigrationOptions`]: Dry-run and normalization switches
//! - [`MigrationReport`]: Per-rule outcome of a run
//!
//! ## Storage
//!
//! - [`ConfigurationStore`]: Storage provider trait
//! - [`MemoryConfigurationStore`]: In-process backend
//! - `SledConfigurationStore`: sled backend (feature `sled`)
//!
//! ## Error Handling
//!
//! - [`ConfigMigrateError`]: Error type for all operations
//! - [`ConfigMigrateResult`]: Result alias (`Result<T, ConfigMigrateError>`)

pub use crate::config::{MigrationOptions, SledStoreConfig};
pub use crate::databases::MemoryConfigurationStore;
#[cfg(feature = "sled")]
pub use crate::databases::SledConfigurationStore;
pub use crate::discovery::{
    ConfigurationType, DiscoveredRules, MethodSignature, MigrationMethod, Normalizer,
    RuleDeclarationSource, RuleDiscovery, TypeKey, TypeRegistry, typed_normalizer,
};
pub use crate::engine::MigrationEngine;
pub use crate::errors::{ConfigMigrateError, ConfigMigrateResult};
pub use crate::executor::{
    MigrationExecutor, MigrationReport, Normalization, RuleOutcome, RuleStatus,
};
pub use crate::graph::VersionGraph;
pub use crate::location::{ConfigurationLocation, StorageScope};
pub use crate::logging::{LogEntry, LogFacade, LogLevel, MemoryLogger, MigrationLogger};
pub use crate::payload::{Payload, StoredConfiguration};
pub use crate::resolver::PathResolver;
pub use crate::rule::{MigrationPath, Transform, UpgradeRule};
pub use crate::traits::{Configuration, ConfigurationStore, MigrateFrom};
pub use crate::version::Version;
