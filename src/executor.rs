//! Sequential execution of a migration path.
//!
//! Rules run one after another in path order. A failing rule is logged and
//! recorded, and the next rule still runs: forward progress is preferred over
//! all-or-nothing atomicity. Afterwards the stored payload is normalized into
//! the live serialization shape whether or not any rule fired.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::config::MigrationOptions;
use crate::discovery::{Normalizer, TypeKey};
use crate::location::ConfigurationLocation;
use crate::logging::MigrationLogger;
use crate::payload::StoredConfiguration;
use crate::rule::{MigrationPath, UpgradeRule};
use crate::traits::store::ConfigurationStore;
use crate::version::Version;

/// What happened to one rule of the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleStatus {
    /// The transform ran and its result was written.
    Applied,
    /// Nothing was stored at the rule's read location.
    Skipped,
    /// Reading, transforming or writing failed.
    Failed(String),
    /// Dry run; the rule would have run.
    Planned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub origin: String,
    pub from: Version,
    pub to: Version,
    pub status: RuleStatus,
}

/// Summary of one migration run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub root: TypeKey,
    /// Version found in storage before the run.
    pub stored_version: Version,
    /// Version the live configuration was normalized to.
    pub target_version: Version,
    pub outcomes: Vec<RuleOutcome>,
    pub normalized: bool,
    pub dry_run: bool,
}

impl MigrationReport {
    pub fn applied(&self) -> usize {
        self.count(|s| *s == RuleStatus::Applied)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, RuleStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| *s == RuleStatus::Skipped)
    }

    pub fn has_errors(&self) -> bool {
        self.failed() > 0
    }

    /// `(from, to)` of every rule on the path, in execution order.
    pub fn pairs(&self) -> Vec<(Version, Version)> {
        self.outcomes.iter().map(|o| (o.from, o.to)).collect()
    }

    fn count(&self, predicate: impl Fn(&RuleStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// Where and how the final normalization writes.
pub struct Normalization<'a> {
    /// Live location of the configuration.
    pub location: &'a ConfigurationLocation,
    /// Version the live configuration is stamped with once the whole path
    /// has been applied.
    pub version: Version,
    pub normalizer: Option<&'a Normalizer>,
}

pub struct MigrationExecutor<'a, S: ?Sized, L: ?Sized> {
    store: &'a S,
    logger: &'a L,
    options: &'a MigrationOptions,
}

impl<'a, S, L> MigrationExecutor<'a, S, L>
where
    S: ConfigurationStore + ?Sized,
    L: MigrationLogger + ?Sized,
{
    pub fn new(store: &'a S, logger: &'a L, options: &'a MigrationOptions) -> Self {
        Self {
            store,
            logger,
            options,
        }
    }

    /// Run every rule of `path` in order, then normalize.
    ///
    /// Returns one outcome per rule plus whether normalization wrote.
    pub fn execute(
        &self,
        path: &MigrationPath,
        normalization: &Normalization<'_>,
    ) -> (Vec<RuleOutcome>, bool) {
        let outcomes: Vec<RuleOutcome> = path
            .iter()
            .map(|rule| RuleOutcome {
                origin: rule.origin().to_string(),
                from: rule.from(),
                to: rule.to(),
                status: self.run_rule(rule),
            })
            .collect();

        let normalized = if self.options.dry_run || !self.options.normalize {
            false
        } else {
            self.normalize(path, &outcomes, normalization)
        };

        (outcomes, normalized)
    }

    fn run_rule(&self, rule: &UpgradeRule) -> RuleStatus {
        if self.options.dry_run {
            self.logger.debug(&format!("dry run: would apply {rule}"));
            return RuleStatus::Planned;
        }

        let stored = match self.store.try_read(rule.read_from()) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                self.logger.debug(&format!(
                    "skipping {rule}: nothing stored at {}",
                    rule.read_from()
                ));
                return RuleStatus::Skipped;
            }
            Err(e) => {
                self.logger
                    .error(&format!("reading {} for {rule} failed", rule.read_from()), Some(&e));
                return RuleStatus::Failed(e.to_string());
            }
        };

        let payload =
            match panic::catch_unwind(AssertUnwindSafe(|| rule.apply(&stored.payload))) {
                Ok(Ok(payload)) => payload,
                Ok(Err(e)) => {
                    let cause: &(dyn std::error::Error + 'static) = e.as_ref();
                    self.logger.error(&format!("rule {rule} failed"), Some(cause));
                    return RuleStatus::Failed(format!("{e:#}"));
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    self.logger
                        .error(&format!("rule {rule} panicked: {message}"), None);
                    return RuleStatus::Failed(message);
                }
            };

        let written = StoredConfiguration::new(rule.to(), payload);
        match self.store.write(rule.write_to(), &written) {
            Ok(()) => {
                self.logger.debug(&format!("applied {rule}"));
                RuleStatus::Applied
            }
            Err(e) => {
                self.logger
                    .error(&format!("writing {} for {rule} failed", rule.write_to()), Some(&e));
                RuleStatus::Failed(e.to_string())
            }
        }
    }

    /// Rewrite whatever is stored in the live serialization shape.
    ///
    /// The normalization version is only stamped when every rule of the path
    /// was applied. Otherwise the payload is rewritten unchanged at the last
    /// version the path reached without a gap, so the next run picks the
    /// remaining rules up again.
    fn normalize(
        &self,
        path: &MigrationPath,
        outcomes: &[RuleOutcome],
        normalization: &Normalization<'_>,
    ) -> bool {
        let primary = path
            .last()
            .map(UpgradeRule::write_to)
            .unwrap_or(normalization.location);
        let fallback = path.first().map(UpgradeRule::read_from);

        let (existing, from_primary) = match self.read_stored(primary) {
            Some(stored) => (Some(stored), true),
            None => (
                fallback
                    .filter(|location| *location != primary)
                    .and_then(|location| self.read_stored(location)),
                false,
            ),
        };

        let stored = match reached_version(outcomes) {
            Some(reached) => {
                let Some(existing) = existing else {
                    return self.write_normalized(normalization, normalization.normalizer, None);
                };
                let version = existing.version.min(reached);
                self.logger.warn(
                    &format!(
                        "{} left at {version}: not every rule on the path was applied",
                        normalization.location
                    ),
                    None,
                );
                StoredConfiguration::new(version, existing.payload)
            }
            None => match (normalization.normalizer, existing) {
                (Some(normalizer), existing) => {
                    return self.write_normalized(normalization, Some(normalizer), existing);
                }
                (None, Some(existing)) if from_primary && !path.is_empty() => {
                    StoredConfiguration::new(normalization.version, existing.payload)
                }
                (None, Some(existing)) => existing,
                (None, None) => {
                    self.logger.debug(&format!(
                        "nothing to normalize at {}",
                        normalization.location
                    ));
                    return false;
                }
            },
        };

        self.write(normalization.location, &stored)
    }

    /// Run the normalizer, if any, and stamp its output with the
    /// normalization version.
    fn write_normalized(
        &self,
        normalization: &Normalization<'_>,
        normalizer: Option<&Normalizer>,
        existing: Option<StoredConfiguration>,
    ) -> bool {
        let Some(normalizer) = normalizer else {
            self.logger.debug(&format!(
                "nothing to normalize at {}",
                normalization.location
            ));
            return false;
        };

        match normalizer(existing.as_ref().map(|stored| &stored.payload)) {
            Ok(payload) => self.write(
                normalization.location,
                &StoredConfiguration::new(normalization.version, payload),
            ),
            Err(e) => {
                let cause: &(dyn std::error::Error + 'static) = e.as_ref();
                self.logger.error(
                    &format!("normalizing {} failed", normalization.location),
                    Some(cause),
                );
                false
            }
        }
    }

    fn write(&self, location: &ConfigurationLocation, stored: &StoredConfiguration) -> bool {
        match self.store.write(location, stored) {
            Ok(()) => {
                self.logger
                    .debug(&format!("normalized {location} at {}", stored.version));
                true
            }
            Err(e) => {
                self.logger
                    .error(&format!("writing normalized {location} failed"), Some(&e));
                false
            }
        }
    }

    fn read_stored(&self, location: &ConfigurationLocation) -> Option<StoredConfiguration> {
        match self.store.try_read(location) {
            Ok(stored) => stored,
            Err(e) => {
                self.logger
                    .warn(&format!("could not read {location} for normalization"), Some(&e));
                None
            }
        }
    }
}

/// Version reached before the first rule that was not applied, or `None`
/// when the whole path was applied.
fn reached_version(outcomes: &[RuleOutcome]) -> Option<Version> {
    let gap = outcomes
        .iter()
        .position(|outcome| outcome.status != RuleStatus::Applied)?;
    Some(outcomes[gap].from)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
