//! Rule discovery over declared configuration types.
//!
//! Discovery starts at a root configuration type and walks every type reachable
//! through migration method signatures, declared references and the
//! "previous version" back-pointer, turning each usable migration method into
//! an [`UpgradeRule`].
//!
//! # Architecture
//!
//! Configuration types form a potentially cyclic graph: a type names its
//! previous version, methods name older and newer types, and nothing stops two
//! types from naming each other. The walk therefore carries a visited set keyed
//! by [`TypeKey`] for the duration of one [`RuleDiscovery::discover`] call.
//!
//! Problems with individual methods are logged and the method is skipped.
//! Two rules claiming the same `(from, to)` pair make the whole discovery fail,
//! since the resulting graph cannot be used safely.

mod registry;

pub use registry::*;

use std::collections::HashSet;
use std::fmt;

use crate::errors::{ConfigMigrateError, ConfigMigrateResult};
use crate::graph;
use crate::location::ConfigurationLocation;
use crate::logging::MigrationLogger;
use crate::rule::UpgradeRule;
use crate::version::Version;

/// Source of declared configuration types.
///
/// Any mechanism that can describe a type by its key works: explicit
/// registration ([`TypeRegistry`]), generated code, or a loaded manifest.
pub trait RuleDeclarationSource {
    fn describe(&self, key: &TypeKey) -> Option<&ConfigurationType>;
}

impl<S: RuleDeclarationSource + ?Sized> RuleDeclarationSource for &S {
    fn describe(&self, key: &TypeKey) -> Option<&ConfigurationType> {
        (**self).describe(key)
    }
}

/// Everything one discovery pass learned about a root type.
#[derive(Clone)]
pub struct DiscoveredRules {
    pub root: TypeKey,
    pub declared_version: Option<Version>,
    pub location: ConfigurationLocation,
    pub normalizer: Option<Normalizer>,
    /// Rules in the order they were discovered.
    pub rules: Vec<UpgradeRule>,
}

impl fmt::Debug for DiscoveredRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredRules")
            .field("root", &self.root)
            .field("declared_version", &self.declared_version)
            .field("location", &self.location)
            .field("normalizer", &self.normalizer.is_some())
            .field("rules", &self.rules)
            .finish()
    }
}

/// Walks a [`RuleDeclarationSource`] from a root type.
pub struct RuleDiscovery<'a, S: ?Sized, L: ?Sized> {
    source: &'a S,
    logger: &'a L,
}

impl<'a, S, L> RuleDiscovery<'a, S, L>
where
    S: RuleDeclarationSource + ?Sized,
    L: MigrationLogger + ?Sized,
{
    pub fn new(source: &'a S, logger: &'a L) -> Self {
        Self { source, logger }
    }

    /// Collect every rule reachable from `root`.
    ///
    /// Fails with [`ConfigMigrateError::UnknownType`] when the root is not
    /// declared and with [`ConfigMigrateError::AmbiguousRule`] when two rules
    /// share a `(from, to)` pair.
    pub fn discover(&self, root: &TypeKey) -> ConfigMigrateResult<DiscoveredRules> {
        let root_type = self
            .source
            .describe(root)
            .ok_or_else(|| ConfigMigrateError::UnknownType(root.clone()))?;

        let mut visited = HashSet::new();
        let mut rules = Vec::new();
        self.visit(root_type, &mut visited, &mut rules);

        graph::index_rules(&rules)?;

        self.logger.debug(&format!(
            "discovered {} rule(s) across {} type(s) from {}",
            rules.len(),
            visited.len(),
            root
        ));

        Ok(DiscoveredRules {
            root: root.clone(),
            declared_version: root_type.version,
            location: root_type.location.clone(),
            normalizer: root_type.normalizer.clone(),
            rules,
        })
    }

    fn visit(
        &self,
        ty: &ConfigurationType,
        visited: &mut HashSet<TypeKey>,
        rules: &mut Vec<UpgradeRule>,
    ) {
        if !visited.insert(ty.key.clone()) {
            self.logger
                .warn(&format!("type {} already visited, not following", ty.key), None);
            return;
        }

        self.logger.trace(&format!("visiting type {}", ty.key));

        let mut referenced: Vec<&TypeKey> = Vec::new();
        for method in &ty.methods {
            if let Some(rule) = self.rule_for(ty, method) {
                rules.push(rule);
            }
            referenced.extend(method.signature.referenced_types());
        }
        referenced.extend(ty.references.iter());

        match &ty.previous {
            Some(previous) if *previous == ty.key => {
                self.logger.error(
                    &format!("type {} declares itself as its previous version", ty.key),
                    None,
                );
            }
            Some(previous) => match self.source.describe(previous) {
                Some(previous_type) => self.visit(previous_type, visited, rules),
                None => self.logger.warn(
                    &format!(
                        "previous version {} of type {} is not declared",
                        previous, ty.key
                    ),
                    None,
                ),
            },
            None => {}
        }

        for key in referenced {
            if visited.contains(key) {
                continue;
            }
            match self.source.describe(key) {
                Some(next) => self.visit(next, visited, rules),
                None => self.logger.warn(
                    &format!("type {} referenced from {} is not declared", key, ty.key),
                    None,
                ),
            }
        }
    }

    /// Turn one declared method into a rule, or log why it is skipped.
    fn rule_for(&self, ty: &ConfigurationType, method: &MigrationMethod) -> Option<UpgradeRule> {
        let origin = format!("{}::{}", ty.key, method.name);
        let skip = |reason: String| {
            self.logger
                .warn(&format!("skipping migration method {origin}: {reason}"), None);
            None
        };

        let Some(version) = ty.version else {
            return skip(format!("declaring type {} has no version", ty.key));
        };

        let (from, to, read_from, write_to) = match &method.signature {
            MethodSignature::Typed { parameter, returns } => {
                let Some(parameter_type) = self.source.describe(parameter) else {
                    return skip(format!("parameter type {parameter} is not declared"));
                };
                let Some(parameter_version) = parameter_type.version else {
                    return skip(format!("parameter type {parameter} has no version"));
                };

                if parameter_version < version {
                    // Upgrade from the older parameter into this type.
                    if *returns != ty.key {
                        return skip(format!(
                            "upgrades from {parameter} but returns {returns} instead of {}",
                            ty.key
                        ));
                    }
                    (
                        parameter_version,
                        version,
                        parameter_type.location.clone(),
                        ty.location.clone(),
                    )
                } else {
                    // Upgrade from this type into a newer one.
                    if *parameter != ty.key {
                        return skip(format!(
                            "parameter {parameter} is neither older than nor equal to {}",
                            ty.key
                        ));
                    }
                    let Some(return_type) = self.source.describe(returns) else {
                        return skip(format!("return type {returns} is not declared"));
                    };
                    let Some(return_version) = return_type.version else {
                        return skip(format!("return type {returns} has no version"));
                    };
                    if return_version <= version {
                        return skip(format!(
                            "return type {returns} at {return_version} is not newer than {version}"
                        ));
                    }
                    (
                        version,
                        return_version,
                        ty.location.clone(),
                        return_type.location.clone(),
                    )
                }
            }
            MethodSignature::Raw {
                from_version,
                read_from,
                returns,
            } => {
                if *returns != ty.key {
                    return skip(format!(
                        "raw method returns {returns} instead of {}",
                        ty.key
                    ));
                }
                if *from_version >= version {
                    return skip(format!(
                        "raw method reads {from_version}, which is not older than {version}"
                    ));
                }
                (*from_version, version, read_from.clone(), ty.location.clone())
            }
        };

        match UpgradeRule::with_transform(
            origin.clone(),
            from,
            to,
            read_from,
            write_to,
            method.transform.clone(),
        ) {
            Ok(rule) => {
                self.logger.trace(&format!("collected rule {rule}"));
                Some(rule)
            }
            Err(e) => {
                self.logger
                    .warn(&format!("skipping migration method {origin}"), Some(&e));
                None
            }
        }
    }
}
