// Common test utilities and helpers
#![allow(dead_code)]

use config_migrate::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Route `log` output through env_logger; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn v(major: u32, minor: u32) -> Version {
    Version::new(major, minor)
}

/// The slot every `Settings*` type lives in.
pub fn settings_location() -> ConfigurationLocation {
    ConfigurationLocation::local("app", "settings")
}

/// Rule that tags the payload with its origin, so tests can see which rules ran.
pub fn tagging_rule(origin: &str, from: Version, to: Version) -> UpgradeRule {
    let tag = origin.to_string();
    UpgradeRule::new(
        origin,
        from,
        to,
        settings_location(),
        settings_location(),
        move |payload: &Payload| {
            let mut value = payload.as_value().clone();
            let applied = value
                .as_object_mut()
                .ok_or_else(|| anyhow::anyhow!("payload is not an object"))?
                .entry("applied")
                .or_insert_with(|| json!([]));
            if let Some(list) = applied.as_array_mut() {
                list.push(json!(tag));
            }
            Ok(Payload::from(value))
        },
    )
    .unwrap()
}

pub fn failing_rule(origin: &str, from: Version, to: Version) -> UpgradeRule {
    UpgradeRule::new(
        origin,
        from,
        to,
        settings_location(),
        settings_location(),
        |_: &Payload| Err(anyhow::anyhow!("transform exploded")),
    )
    .unwrap()
}

pub fn panicking_rule(origin: &str, from: Version, to: Version) -> UpgradeRule {
    UpgradeRule::new(
        origin,
        from,
        to,
        settings_location(),
        settings_location(),
        |_: &Payload| -> anyhow::Result<Payload> { panic!("transform panicked") },
    )
    .unwrap()
}

pub fn graph_of(rules: Vec<UpgradeRule>) -> VersionGraph {
    VersionGraph::build(rules).unwrap()
}

/// Write a JSON document at `location` stamped with `version`.
pub fn seed(
    store: &impl ConfigurationStore,
    location: &ConfigurationLocation,
    version: Version,
    value: serde_json::Value,
) {
    store
        .write(location, &StoredConfiguration::new(version, Payload::from(value)))
        .unwrap();
}

/// Origins recorded by [`tagging_rule`] transforms, in application order.
pub fn applied_tags(stored: &StoredConfiguration) -> Vec<String> {
    stored
        .payload
        .get("applied")
        .and_then(|a| a.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// A three-release settings history.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsV1 {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsV2 {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsV3 {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub theme: String,
}

impl Configuration for SettingsV1 {
    const TYPE_KEY: &'static str = "settings.v1";
    const VERSION: Option<Version> = Some(Version::new(1, 0));

    fn location() -> ConfigurationLocation {
        settings_location()
    }
}

impl MigrateFrom<SettingsV1> for SettingsV2 {
    fn migrate_from(old: SettingsV1) -> Self {
        let (first, last) = old.name.split_once(' ').unwrap_or((old.name.as_str(), ""));
        SettingsV2 {
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }
}

impl Configuration for SettingsV2 {
    const TYPE_KEY: &'static str = "settings.v2";
    const VERSION: Option<Version> = Some(Version::new(2, 0));

    fn location() -> ConfigurationLocation {
        settings_location()
    }

    fn previous() -> Option<TypeKey> {
        Some(TypeKey::of::<SettingsV1>())
    }

    fn migrations() -> Vec<MigrationMethod> {
        vec![MigrationMethod::upgrade::<SettingsV1, SettingsV2>("from_v1")]
    }
}

impl MigrateFrom<SettingsV2> for SettingsV3 {
    fn migrate_from(old: SettingsV2) -> Self {
        SettingsV3 {
            first_name: old.first_name,
            last_name: old.last_name,
            theme: "light".to_string(),
        }
    }
}

impl Configuration for SettingsV3 {
    const TYPE_KEY: &'static str = "settings.v3";
    const VERSION: Option<Version> = Some(Version::new(3, 0));

    fn location() -> ConfigurationLocation {
        settings_location()
    }

    fn previous() -> Option<TypeKey> {
        Some(TypeKey::of::<SettingsV2>())
    }

    fn migrations() -> Vec<MigrationMethod> {
        vec![MigrationMethod::upgrade::<SettingsV2, SettingsV3>("from_v2")]
    }
}

/// Registry holding the full `SettingsV1 -> V2 -> V3` history.
pub fn settings_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_type::<SettingsV1>();
    registry.register_type::<SettingsV2>();
    registry.register_type::<SettingsV3>();
    registry
}
