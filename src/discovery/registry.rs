//! Explicit registration of configuration types and their migration methods.
//!
//! [`TypeRegistry`] is the default [`RuleDeclarationSource`]: application code
//! registers one [`ConfigurationType`] per configuration shape, either by hand
//! through the builder or from a [`Configuration`] implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use derive_more::{Display, From};
use serde_json::Value;
use typed_builder::TypedBuilder;

use crate::location::ConfigurationLocation;
use crate::payload::Payload;
use crate::rule::Transform;
use crate::traits::migration::{Configuration, MigrateFrom};
use crate::version::Version;

use super::RuleDeclarationSource;

/// Stable identity of a configuration type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn of<T: Configuration>() -> Self {
        Self::new(T::TYPE_KEY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Rewrites a payload in the live serialization shape.
///
/// Receives whatever sits in storage (or `None` when nothing does) and returns
/// the payload to persist.
pub type Normalizer = Arc<dyn Fn(Option<&Payload>) -> anyhow::Result<Payload> + Send + Sync>;

/// Normalizer that round-trips through `T`, falling back to `T::default()`
/// when storage is empty.
pub fn typed_normalizer<T: Configuration>() -> Normalizer {
    Arc::new(normalize_as::<T>)
}

fn normalize_as<T: Configuration>(existing: Option<&Payload>) -> anyhow::Result<Payload> {
    let value = match existing {
        Some(payload) => payload.to_value::<T>()?,
        None => T::default(),
    };
    Ok(Payload::from_value(&value)?)
}

/// Declared parameter and return shape of a migration method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSignature {
    /// `fn(parameter) -> returns`. Direction is decided during discovery by
    /// comparing the parameter's version with the declaring type's.
    Typed { parameter: TypeKey, returns: TypeKey },
    /// `fn(raw_json, parsed) -> returns`, for an older shape that has no type
    /// of its own. Version and location of the old data are declared here.
    Raw {
        from_version: Version,
        read_from: ConfigurationLocation,
        returns: TypeKey,
    },
}

impl MethodSignature {
    /// Types this signature mentions, in declaration order.
    pub fn referenced_types(&self) -> Vec<&TypeKey> {
        match self {
            MethodSignature::Typed { parameter, returns } => vec![parameter, returns],
            MethodSignature::Raw { returns, .. } => vec![returns],
        }
    }
}

/// A migration method declared on a configuration type.
#[derive(Clone)]
pub struct MigrationMethod {
    pub name: String,
    pub signature: MethodSignature,
    pub transform: Transform,
}

impl MigrationMethod {
    /// Declare a method from its signature and an untyped payload transform.
    pub fn new<F>(name: impl Into<String>, signature: MethodSignature, transform: F) -> Self
    where
        F: Fn(&Payload) -> anyhow::Result<Payload> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature,
            transform: Arc::new(transform),
        }
    }

    /// Declare a typed, fallible conversion `P -> R`.
    pub fn typed<P, R, F>(name: impl Into<String>, convert: F) -> Self
    where
        P: Configuration,
        R: Configuration,
        F: Fn(P) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let signature = MethodSignature::Typed {
            parameter: TypeKey::of::<P>(),
            returns: TypeKey::of::<R>(),
        };
        Self::new(name, signature, move |payload: &Payload| {
            let old = payload.to_value::<P>()?;
            let new = convert(old)?;
            Ok(Payload::from_value(&new)?)
        })
    }

    /// Declare the [`MigrateFrom`] conversion `Old -> New`.
    pub fn upgrade<Old, New>(name: impl Into<String>) -> Self
    where
        Old: Configuration,
        New: Configuration + MigrateFrom<Old>,
    {
        Self::typed::<Old, New, _>(name, |old| Ok(New::migrate_from(old)))
    }

    /// Declare a two-parameter conversion reading an untyped older payload.
    pub fn raw<R, F>(
        name: impl Into<String>,
        from_version: Version,
        read_from: ConfigurationLocation,
        convert: F,
    ) -> Self
    where
        R: Configuration,
        F: Fn(&str, &Value) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let signature = MethodSignature::Raw {
            from_version,
            read_from,
            returns: TypeKey::of::<R>(),
        };
        Self::new(name, signature, move |payload: &Payload| {
            let raw = payload.to_json();
            let new = convert(&raw, payload.as_value())?;
            Ok(Payload::from_value(&new)?)
        })
    }
}

impl fmt::Debug for MigrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationMethod")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Declared metadata of one configuration type.
///
/// # Example
///
/// ```
/// use config_migrate::prelude::*;
///
/// let settings = ConfigurationType::builder()
///     .key("settings.v2")
///     .version(Version::new(2, 0))
///     .location(ConfigurationLocation::local("app", "settings"))
///     .previous("settings.v1")
///     .build();
///
/// assert_eq!(settings.key.as_str(), "settings.v2");
/// assert!(settings.methods.is_empty());
/// ```
#[derive(Clone, TypedBuilder)]
#[builder(doc)]
pub struct ConfigurationType {
    #[builder(setter(into))]
    pub key: TypeKey,

    /// Declared version; unversioned types leave the target to the rules.
    #[builder(default, setter(strip_option))]
    pub version: Option<Version>,

    pub location: ConfigurationLocation,

    /// The type describing the previous version.
    #[builder(default, setter(strip_option, into))]
    pub previous: Option<TypeKey>,

    #[builder(default)]
    pub references: Vec<TypeKey>,

    #[builder(default)]
    pub methods: Vec<MigrationMethod>,

    #[builder(default, setter(strip_option))]
    pub normalizer: Option<Normalizer>,
}

impl ConfigurationType {
    /// Descriptor built from a [`Configuration`] implementation, with a typed
    /// normalizer.
    pub fn of<T: Configuration>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            version: T::VERSION,
            location: T::location(),
            previous: T::previous(),
            references: T::references(),
            methods: T::migrations(),
            normalizer: Some(typed_normalizer::<T>()),
        }
    }

    pub fn with_method(mut self, method: MigrationMethod) -> Self {
        self.methods.push(method);
        self
    }
}

impl fmt::Debug for ConfigurationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationType")
            .field("key", &self.key)
            .field("version", &self.version)
            .field("location", &self.location)
            .field("previous", &self.previous)
            .field("references", &self.references)
            .field("methods", &self.methods)
            .field("normalizer", &self.normalizer.is_some())
            .finish()
    }
}

/// In-memory rule declaration source keyed by [`TypeKey`].
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<TypeKey, ConfigurationType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, returning the one it replaced.
    pub fn register(&mut self, ty: ConfigurationType) -> Option<ConfigurationType> {
        self.types.insert(ty.key.clone(), ty)
    }

    pub fn register_type<T: Configuration>(&mut self) -> Option<ConfigurationType> {
        self.register(ConfigurationType::of::<T>())
    }

    pub fn get(&self, key: &TypeKey) -> Option<&ConfigurationType> {
        self.types.get(key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl RuleDeclarationSource for TypeRegistry {
    fn describe(&self, key: &TypeKey) -> Option<&ConfigurationType> {
        self.get(key)
    }
}
