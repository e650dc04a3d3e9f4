//! The version graph: discovered rules indexed by `(from, to)`.

use std::collections::HashMap;

use crate::errors::{ConfigMigrateError, ConfigMigrateResult};
use crate::rule::UpgradeRule;
use crate::version::Version;

/// Index rules by their `(from, to)` pair, rejecting collisions.
pub(crate) fn index_rules(
    rules: &[UpgradeRule],
) -> ConfigMigrateResult<HashMap<(Version, Version), usize>> {
    let mut index = HashMap::with_capacity(rules.len());
    for (position, rule) in rules.iter().enumerate() {
        if let Some(&existing) = index.get(&rule.pair()) {
            let first: &UpgradeRule = &rules[existing];
            return Err(ConfigMigrateError::AmbiguousRule {
                from: rule.from(),
                to: rule.to(),
                first: first.origin().to_string(),
                second: rule.origin().to_string(),
            });
        }
        index.insert(rule.pair(), position);
    }
    Ok(index)
}

/// Directed graph of configuration versions.
///
/// Each `(from, to)` pair maps to exactly one rule. Rules keep the order they
/// were discovered in, which is the order path search iterates them.
#[derive(Debug, Clone, Default)]
pub struct VersionGraph {
    rules: Vec<UpgradeRule>,
    index: HashMap<(Version, Version), usize>,
}

impl VersionGraph {
    /// Build the graph. Fails with [`ConfigMigrateError::AmbiguousRule`] if two
    /// rules claim the same edge.
    pub fn build(rules: Vec<UpgradeRule>) -> ConfigMigrateResult<Self> {
        let index = index_rules(&rules)?;
        Ok(Self { rules, index })
    }

    pub fn get(&self, from: Version, to: Version) -> Option<&UpgradeRule> {
        self.index.get(&(from, to)).map(|&position| &self.rules[position])
    }

    pub fn rules(&self) -> &[UpgradeRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn has_edge_from(&self, version: Version) -> bool {
        self.rules.iter().any(|r| r.from() == version)
    }

    pub fn has_edge_to(&self, version: Version) -> bool {
        self.rules.iter().any(|r| r.to() == version)
    }

    /// Highest version any rule migrates to.
    pub fn highest_target(&self) -> Option<Version> {
        self.rules.iter().map(UpgradeRule::to).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::ConfigurationLocation;
    use crate::payload::Payload;

    fn rule(origin: &str, from: (u32, u32), to: (u32, u32)) -> UpgradeRule {
        let loc = ConfigurationLocation::local("app", "settings");
        UpgradeRule::new(origin, from.into(), to.into(), loc.clone(), loc, |p: &Payload| {
            Ok(p.clone())
        })
        .unwrap()
    }

    #[test]
    fn test_build_indexes_every_edge() {
        let graph =
            VersionGraph::build(vec![rule("a", (1, 0), (2, 0)), rule("b", (2, 0), (3, 0))])
                .unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.get(Version::new(2, 0), Version::new(3, 0)).map(|r| r.origin()),
            Some("b")
        );
        assert!(graph.get(Version::new(1, 0), Version::new(3, 0)).is_none());
        assert!(graph.has_edge_from(Version::new(1, 0)));
        assert!(graph.has_edge_to(Version::new(3, 0)));
        assert!(!graph.has_edge_to(Version::new(1, 0)));
        assert_eq!(graph.highest_target(), Some(Version::new(3, 0)));
    }

    #[test]
    fn test_build_rejects_colliding_edges() {
        let err = VersionGraph::build(vec![
            rule("first", (1, 0), (2, 0)),
            rule("other", (2, 0), (3, 0)),
            rule("second", (1, 0), (2, 0)),
        ])
        .unwrap_err();

        match err {
            ConfigMigrateError::AmbiguousRule {
                from,
                to,
                first,
                second,
            } => {
                assert_eq!((from, to), (Version::new(1, 0), Version::new(2, 0)));
                assert_eq!(first, "first");
                assert_eq!(second, "second");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_graph() {
        let graph = VersionGraph::build(Vec::new()).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.highest_target(), None);
    }
}
