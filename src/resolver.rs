//! Migration path resolution.
//!
//! [`PathResolver::resolve`] turns a `(current, target)` version pair into an
//! ordered [`MigrationPath`] over a [`VersionGraph`]:
//!
//! 1. `current == target`, or an empty graph, resolves to the empty path.
//! 2. Without any rule leaving `current` or any rule reaching `target` there
//!    is no path.
//! 3. Resolving backwards (`current > target`) always fails.
//! 4. A rule for the exact pair wins outright, even when longer chains exist.
//! 5. Otherwise a depth-first search runs backwards from `target` over the
//!    rules with `from >= current` and `to <= target`. The first rule (in
//!    graph order) whose source is itself reachable is accepted, so the result
//!    is the first chain found, not necessarily the shortest.
//!
//! When no target is known, [`PathResolver::schedule_unapplied`] instead
//! checks each rule against storage and schedules the ones not yet applied.

use crate::errors::{ConfigMigrateError, ConfigMigrateResult};
use crate::graph::VersionGraph;
use crate::location::ConfigurationLocation;
use crate::logging::MigrationLogger;
use crate::rule::{MigrationPath, UpgradeRule};
use crate::traits::store::ConfigurationStore;
use crate::version::Version;

pub struct PathResolver<'a, L: ?Sized> {
    logger: &'a L,
}

impl<'a, L: MigrationLogger + ?Sized> PathResolver<'a, L> {
    pub fn new(logger: &'a L) -> Self {
        Self { logger }
    }

    /// Resolve the rules that bring `current` to `target`, oldest edge first.
    pub fn resolve(
        &self,
        graph: &VersionGraph,
        current: Version,
        target: Version,
    ) -> ConfigMigrateResult<MigrationPath> {
        if current == target {
            self.logger
                .debug(&format!("stored version {current} is already current"));
            return Ok(MigrationPath::empty());
        }

        if graph.is_empty() {
            self.logger.debug("no upgrade rules declared");
            return Ok(MigrationPath::empty());
        }

        if !graph.has_edge_from(current) || !graph.has_edge_to(target) {
            return Err(ConfigMigrateError::NoPath { current, target });
        }

        if current > target {
            return Err(ConfigMigrateError::Downgrade { current, target });
        }

        if let Some(direct) = graph.get(current, target) {
            self.logger.trace(&format!("using direct rule {direct}"));
            return Ok(MigrationPath::from(vec![direct.clone()]));
        }

        let pruned: Vec<&UpgradeRule> = graph
            .rules()
            .iter()
            .filter(|r| r.to() <= target && r.from() >= current)
            .collect();

        let mut chain = Vec::new();
        let mut stack = Vec::new();
        if !self.search(&pruned, current, target, &mut stack, &mut chain) {
            return Err(ConfigMigrateError::NoPath { current, target });
        }

        // Collected target-to-source.
        chain.reverse();
        Ok(MigrationPath::from(chain))
    }

    /// Find a chain `current -> target`, pushing rules from the target end.
    ///
    /// `stack` holds the targets currently being searched; a rule whose
    /// source is already on it would close a cycle and is skipped.
    fn search(
        &self,
        pruned: &[&UpgradeRule],
        current: Version,
        target: Version,
        stack: &mut Vec<Version>,
        chain: &mut Vec<UpgradeRule>,
    ) -> bool {
        if current == target {
            return true;
        }

        if let Some(direct) = pruned.iter().find(|r| r.pair() == (current, target)) {
            chain.push((*direct).clone());
            return true;
        }

        stack.push(target);
        for rule in pruned.iter().filter(|r| r.to() == target) {
            if stack.contains(&rule.from()) {
                self.logger
                    .trace(&format!("skipping {rule}: would revisit {}", rule.from()));
                continue;
            }

            let mark = chain.len();
            chain.push((*rule).clone());
            if self.search(pruned, current, rule.from(), stack, chain) {
                stack.pop();
                return true;
            }
            chain.truncate(mark);
        }
        stack.pop();
        false
    }

    /// Schedule every rule whose effect is not yet visible in storage.
    ///
    /// Rules are checked from the highest `to` version down. A rule counts as
    /// applied when the payload at its write location (or, if that is empty,
    /// its read location) is at or above its `to` version. The schedule is
    /// returned oldest edge first.
    pub fn schedule_unapplied<S>(&self, graph: &VersionGraph, store: &S) -> MigrationPath
    where
        S: ConfigurationStore + ?Sized,
    {
        let mut candidates: Vec<&UpgradeRule> = graph.rules().iter().collect();
        candidates.sort_by(|a, b| b.to().cmp(&a.to()));

        let mut scheduled = Vec::new();
        for rule in candidates {
            match self.stored_version_for(rule, store) {
                Some(version) if version >= rule.to() => {
                    self.logger.debug(&format!(
                        "rule {rule} already applied (stored {version})"
                    ));
                }
                _ => {
                    self.logger.trace(&format!("scheduling rule {rule}"));
                    scheduled.push(rule.clone());
                }
            }
        }

        scheduled.sort_by_key(UpgradeRule::to);
        MigrationPath::from(scheduled)
    }

    fn stored_version_for<S>(&self, rule: &UpgradeRule, store: &S) -> Option<Version>
    where
        S: ConfigurationStore + ?Sized,
    {
        let read = |location: &ConfigurationLocation| match store.read_version(location) {
            Ok(version) => version,
            Err(e) => {
                self.logger.warn(
                    &format!("could not read {location} while checking {rule}"),
                    Some(&e),
                );
                None
            }
        };

        read(rule.write_to()).or_else(|| read(rule.read_from()))
    }
}
