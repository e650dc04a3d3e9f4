/// Path execution tests
///
/// This test suite validates:
/// - Rules run in path order and stamp the versions they produce
/// - A failing or panicking rule does not stop the rest of the path
/// - Absent data skips a rule
/// - Normalization with and without a normalizer
/// - Dry runs and disabled normalization leave storage untouched
mod common;

use std::sync::Arc;

use common::*;
use config_migrate::prelude::*;
use serde_json::json;

fn execute(
    store: &MemoryConfigurationStore,
    logger: &MemoryLogger,
    options: &MigrationOptions,
    path: Vec<UpgradeRule>,
    normalizer: Option<&Normalizer>,
    version: Version,
) -> (Vec<RuleOutcome>, bool) {
    let location = settings_location();
    let normalization = Normalization {
        location: &location,
        version,
        normalizer,
    };
    MigrationExecutor::new(store, logger, options).execute(&MigrationPath::from(path), &normalization)
}

fn statuses(outcomes: &[RuleOutcome]) -> Vec<RuleStatus> {
    outcomes.iter().map(|o| o.status.clone()).collect()
}

#[test]
fn test_rules_apply_in_order() {
    init_logging();
    let store = MemoryConfigurationStore::new();
    seed(&store, &settings_location(), v(1, 0), json!({}));
    let logger = MemoryLogger::new();

    let (outcomes, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![
            tagging_rule("a", v(1, 0), v(2, 0)),
            tagging_rule("b", v(2, 0), v(3, 0)),
        ],
        None,
        v(3, 0),
    );

    assert_eq!(statuses(&outcomes), vec![RuleStatus::Applied, RuleStatus::Applied]);
    assert!(normalized);

    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(3, 0));
    assert_eq!(applied_tags(&stored), vec!["a", "b"]);
}

#[test]
fn test_failing_middle_rule_does_not_stop_the_path() {
    let store = MemoryConfigurationStore::new();
    seed(&store, &settings_location(), v(1, 0), json!({}));
    let logger = MemoryLogger::new();

    let (outcomes, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![
            tagging_rule("first", v(1, 0), v(2, 0)),
            failing_rule("second", v(2, 0), v(3, 0)),
            tagging_rule("third", v(3, 0), v(4, 0)),
        ],
        None,
        v(4, 0),
    );

    assert_eq!(outcomes[0].status, RuleStatus::Applied);
    assert!(matches!(&outcomes[1].status, RuleStatus::Failed(m) if m.contains("transform exploded")));
    assert_eq!(outcomes[2].status, RuleStatus::Applied);
    assert!(normalized);

    // Stamped with the version reached before the failure so the rest of the
    // path runs again next time.
    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(2, 0));
    assert_eq!(applied_tags(&stored), vec!["first", "third"]);
    assert!(logger.contains(LogLevel::Error, "second"));
    assert!(logger.contains(LogLevel::Warn, "left at 2.0"));
}

#[test]
fn test_panicking_rule_is_contained() {
    let store = MemoryConfigurationStore::new();
    seed(&store, &settings_location(), v(1, 0), json!({}));
    let logger = MemoryLogger::new();

    let (outcomes, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![
            tagging_rule("first", v(1, 0), v(2, 0)),
            panicking_rule("second", v(2, 0), v(3, 0)),
            tagging_rule("third", v(3, 0), v(4, 0)),
        ],
        None,
        v(4, 0),
    );

    assert!(matches!(&outcomes[1].status, RuleStatus::Failed(m) if m.contains("transform panicked")));
    assert_eq!(outcomes[2].status, RuleStatus::Applied);
    assert!(normalized);
    assert!(logger.contains(LogLevel::Error, "panicked"));

    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(2, 0));
    assert_eq!(applied_tags(&stored), vec!["first", "third"]);
}

#[test]
fn test_failed_first_rule_keeps_stored_version() {
    let store = MemoryConfigurationStore::new();
    seed(&store, &settings_location(), v(1, 0), json!({ "old": 7 }));
    let logger = MemoryLogger::new();

    let (outcomes, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![failing_rule("only", v(1, 0), v(2, 0))],
        None,
        v(2, 0),
    );

    assert!(matches!(&outcomes[0].status, RuleStatus::Failed(_)));
    assert!(normalized);
    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(1, 0));
    assert_eq!(stored.payload.as_value(), &json!({ "old": 7 }));
}

#[test]
fn test_normalizer_skipped_after_a_failed_rule() {
    let store = MemoryConfigurationStore::new();
    seed(&store, &settings_location(), v(2, 0), json!({ "first_name": "Ada" }));
    let logger = MemoryLogger::new();
    let normalizer = typed_normalizer::<SettingsV3>();

    let (_, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![failing_rule("to_v3", v(2, 0), v(3, 0))],
        Some(&normalizer),
        v(3, 0),
    );

    assert!(normalized);
    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(2, 0));
    assert_eq!(stored.payload.as_value(), &json!({ "first_name": "Ada" }));
}

#[test]
fn test_rewrite_without_rules_keeps_stored_version() {
    let store = MemoryConfigurationStore::new();
    seed(&store, &settings_location(), v(1, 0), json!({ "keep": 1 }));
    let logger = MemoryLogger::new();

    let (_, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![],
        None,
        v(3, 0),
    );

    assert!(normalized);
    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(1, 0));
    assert_eq!(stored.payload.as_value(), &json!({ "keep": 1 }));
}

#[test]
fn test_absent_data_skips_rules_and_normalization() {
    let store = MemoryConfigurationStore::new();
    let logger = MemoryLogger::new();

    let (outcomes, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![tagging_rule("a", v(1, 0), v(2, 0))],
        None,
        v(2, 0),
    );

    assert_eq!(statuses(&outcomes), vec![RuleStatus::Skipped]);
    assert!(!normalized);
    assert!(store.is_empty());
}

#[test]
fn test_normalizer_writes_default_when_storage_is_empty() {
    let store = MemoryConfigurationStore::new();
    let logger = MemoryLogger::new();
    let normalizer = typed_normalizer::<SettingsV3>();

    let (outcomes, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![],
        Some(&normalizer),
        v(3, 0),
    );

    assert!(outcomes.is_empty());
    assert!(normalized);

    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(3, 0));
    assert_eq!(stored.payload.to_value::<SettingsV3>().unwrap(), SettingsV3::default());
}

#[test]
fn test_normalizer_fills_fields_added_without_a_rule() {
    let store = MemoryConfigurationStore::new();
    seed(
        &store,
        &settings_location(),
        v(3, 0),
        json!({ "first_name": "Ada", "last_name": "Lovelace", "stale": true }),
    );
    let logger = MemoryLogger::new();
    let normalizer = typed_normalizer::<SettingsV3>();

    let (_, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![],
        Some(&normalizer),
        v(3, 0),
    );
    assert!(normalized);

    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(
        stored.payload.as_value(),
        &json!({ "first_name": "Ada", "last_name": "Lovelace", "theme": "" })
    );
}

#[test]
fn test_failing_normalizer_writes_nothing() {
    let store = MemoryConfigurationStore::new();
    seed(&store, &settings_location(), v(1, 0), json!({ "keep": 1 }));
    let logger = MemoryLogger::new();
    let normalizer: Normalizer = Arc::new(|_: Option<&Payload>| -> anyhow::Result<Payload> {
        Err(anyhow::anyhow!("bad shape"))
    });

    let (_, normalized) = execute(
        &store,
        &logger,
        &MigrationOptions::default(),
        vec![],
        Some(&normalizer),
        v(2, 0),
    );

    assert!(!normalized);
    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(1, 0));
    assert_eq!(stored.payload.as_value(), &json!({ "keep": 1 }));
    assert!(logger.contains(LogLevel::Error, "normalizing"));
}

#[test]
fn test_dry_run_plans_without_writing() {
    let store = MemoryConfigurationStore::new();
    seed(&store, &settings_location(), v(1, 0), json!({}));
    let logger = MemoryLogger::new();
    let options = MigrationOptions::builder().dry_run(true).build();

    let (outcomes, normalized) = execute(
        &store,
        &logger,
        &options,
        vec![tagging_rule("a", v(1, 0), v(2, 0))],
        None,
        v(2, 0),
    );

    assert_eq!(statuses(&outcomes), vec![RuleStatus::Planned]);
    assert!(!normalized);
    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(1, 0));
    assert!(applied_tags(&stored).is_empty());
}

#[test]
fn test_normalization_can_be_disabled() {
    let store = MemoryConfigurationStore::new();
    seed(&store, &settings_location(), v(1, 0), json!({}));
    let logger = MemoryLogger::new();
    let options = MigrationOptions::builder().normalize(false).build();

    let (outcomes, normalized) = execute(
        &store,
        &logger,
        &options,
        vec![tagging_rule("a", v(1, 0), v(2, 0))],
        None,
        v(3, 0),
    );

    assert_eq!(statuses(&outcomes), vec![RuleStatus::Applied]);
    assert!(!normalized);
    // Left at the version the rule produced, not the normalization version.
    let stored = store.try_read(&settings_location()).unwrap().unwrap();
    assert_eq!(stored.version, v(2, 0));
}
