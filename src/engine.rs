//! The configuration migration engine.
//!
//! One [`MigrationEngine::upgrade_configuration`] call runs the whole pipeline
//! for a root configuration type:
//!
//! 1. discover the declared rules ([`RuleDiscovery`]),
//! 2. index them into a [`VersionGraph`],
//! 3. read the stored version and resolve a [`MigrationPath`]
//!    ([`PathResolver`]),
//! 4. execute the path and normalize ([`MigrationExecutor`]).
//!
//! Failures in steps 1 to 3 are logged and returned before anything is written.
//! Failures of individual rules in step 4 are logged and recorded in the
//! [`MigrationReport`]; the remaining rules and normalization still run.

use crate::config::MigrationOptions;
use crate::discovery::{DiscoveredRules, RuleDeclarationSource, RuleDiscovery, TypeKey};
use crate::errors::ConfigMigrateResult;
use crate::executor::{MigrationExecutor, MigrationReport, Normalization};
use crate::graph::VersionGraph;
use crate::logging::{LogFacade, MigrationLogger};
use crate::resolver::PathResolver;
use crate::rule::MigrationPath;
use crate::traits::migration::Configuration;
use crate::traits::store::ConfigurationStore;
use crate::version::Version;

/// Migrates persisted configuration to the shape the live code declares.
///
/// The engine owns its store and logger and is single-threaded: callers must
/// not run two migrations of the same location at once.
///
/// # Example
///
/// ```
/// use config_migrate::prelude::*;
///
/// let mut registry = TypeRegistry::new();
/// registry.register(
///     ConfigurationType::builder()
///         .key("settings")
///         .version(Version::new(1, 0))
///         .location(ConfigurationLocation::local("app", "settings"))
///         .build(),
/// );
///
/// let engine = MigrationEngine::new(MemoryConfigurationStore::new(), MemoryLogger::new());
/// let report = engine
///     .upgrade_configuration(&registry, &TypeKey::new("settings"))
///     .unwrap();
/// assert!(report.outcomes.is_empty());
/// ```
pub struct MigrationEngine<S, L = LogFacade> {
    store: S,
    logger: L,
    options: MigrationOptions,
}

impl<S: ConfigurationStore> MigrationEngine<S, LogFacade> {
    /// Engine logging through the `log` facade.
    pub fn with_log_facade(store: S) -> Self {
        Self::new(store, LogFacade)
    }
}

impl<S, L> MigrationEngine<S, L>
where
    S: ConfigurationStore,
    L: MigrationLogger,
{
    pub fn new(store: S, logger: L) -> Self {
        Self::with_options(store, logger, MigrationOptions::default())
    }

    pub fn with_options(store: S, logger: L, options: MigrationOptions) -> Self {
        Self {
            store,
            logger,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Upgrade the configuration rooted at `T` to `T`'s declared version.
    pub fn upgrade<T, R>(&self, source: &R) -> ConfigMigrateResult<MigrationReport>
    where
        T: Configuration,
        R: RuleDeclarationSource + ?Sized,
    {
        self.upgrade_configuration(source, &TypeKey::of::<T>())
    }

    /// Upgrade the configuration rooted at `root` to its declared version.
    ///
    /// When the root declares no version, every rule not yet reflected in
    /// storage is scheduled instead of resolving a path.
    pub fn upgrade_configuration<R>(
        &self,
        source: &R,
        root: &TypeKey,
    ) -> ConfigMigrateResult<MigrationReport>
    where
        R: RuleDeclarationSource + ?Sized,
    {
        self.run(source, root, None)
    }

    /// Upgrade the configuration rooted at `root` to an explicit `target`,
    /// overriding the declared version.
    pub fn upgrade_to<R>(
        &self,
        source: &R,
        root: &TypeKey,
        target: Version,
    ) -> ConfigMigrateResult<MigrationReport>
    where
        R: RuleDeclarationSource + ?Sized,
    {
        self.run(source, root, Some(target))
    }

    fn run<R>(
        &self,
        source: &R,
        root: &TypeKey,
        explicit_target: Option<Version>,
    ) -> ConfigMigrateResult<MigrationReport>
    where
        R: RuleDeclarationSource + ?Sized,
    {
        let discovered = RuleDiscovery::new(source, &self.logger)
            .discover(root)
            .inspect_err(|e| {
                self.logger
                    .fatal(&format!("could not enumerate rules for {root}"), Some(e))
            })?;

        let graph = VersionGraph::build(discovered.rules.clone()).inspect_err(|e| {
            self.logger
                .fatal(&format!("version graph for {root} is unusable"), Some(e))
        })?;

        let stored_version = self.current_version(&discovered, &graph).inspect_err(|e| {
            self.logger
                .error(&format!("could not read stored version of {root}"), Some(e))
        })?;

        let resolver = PathResolver::new(&self.logger);
        let (path, target_version) = match explicit_target.or(discovered.declared_version) {
            Some(target) => {
                let path = resolver
                    .resolve(&graph, stored_version, target)
                    .inspect_err(|e| {
                        self.logger.fatal(
                            &format!("cannot migrate {root} from {stored_version} to {target}"),
                            Some(e),
                        )
                    })?;
                (path, target)
            }
            None => {
                let path = resolver.schedule_unapplied(&graph, &self.store);
                let target = graph.highest_target().unwrap_or(stored_version);
                (path, target)
            }
        };

        self.log_plan(root, stored_version, target_version, &path);

        // The root normalizer only knows the root's declared shape.
        let normalizer = match explicit_target {
            Some(target) if Some(target) != discovered.declared_version => None,
            _ => discovered.normalizer.as_ref(),
        };
        let normalization = Normalization {
            location: &discovered.location,
            version: target_version,
            normalizer,
        };
        let executor = MigrationExecutor::new(&self.store, &self.logger, &self.options);
        let (outcomes, normalized) = executor.execute(&path, &normalization);

        let report = MigrationReport {
            root: root.clone(),
            stored_version,
            target_version,
            outcomes,
            normalized,
            dry_run: self.options.dry_run,
        };

        if report.has_errors() {
            self.logger.warn(
                &format!(
                    "migration of {root} finished with {} failed rule(s)",
                    report.failed()
                ),
                None,
            );
        }

        Ok(report)
    }

    /// Version currently persisted for a root type.
    ///
    /// The live location is read first. If it is empty, the read locations of
    /// the discovered rules are probed in discovery order so that data written
    /// by an older release to a different slot is still found. With nothing
    /// stored anywhere the result is [`Version::ZERO`].
    pub fn current_version(
        &self,
        discovered: &DiscoveredRules,
        graph: &VersionGraph,
    ) -> ConfigMigrateResult<Version> {
        if let Some(version) = self.store.read_version(&discovered.location)? {
            return Ok(version);
        }

        for rule in graph.rules() {
            if *rule.read_from() == discovered.location {
                continue;
            }
            if let Some(version) = self.store.read_version(rule.read_from())? {
                self.logger.debug(&format!(
                    "found {} data at {} for {}",
                    version,
                    rule.read_from(),
                    discovered.root
                ));
                return Ok(version);
            }
        }

        Ok(Version::ZERO)
    }

    fn log_plan(&self, root: &TypeKey, stored: Version, target: Version, path: &MigrationPath) {
        if path.is_empty() {
            self.logger
                .debug(&format!("{root}: nothing to migrate ({stored} -> {target})"));
            return;
        }

        let steps = path
            .iter()
            .map(|rule| rule.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.logger.debug(&format!(
            "{root}: migrating {stored} -> {target} via {steps}"
        ));
    }
}
