//! Config file loading through the client

use crate::common::*;
use durakv::{
    ClientConfig, DurabilityRequirement, Error, FailureKind, InMemoryStore, KvClient, OpOptions,
    OperationOutcome, Topology, CONFIG_FILE_NAME,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn default_file_is_written_and_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    ClientConfig::write_default_if_missing(&path).unwrap();

    init_tracing();
    let client = KvClient::from_config_file(Arc::new(InMemoryStore::new()), &path).unwrap();
    assert_eq!(client.defaults().retry.max_attempts, 5);
    assert_eq!(client.defaults().durability, DurabilityRequirement::None);
    assert_eq!(client.defaults().timeout, None);
}

#[test]
fn file_durability_applies_to_every_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        r#"
durability = "persist_to_majority"

[retry]
max_attempts = 2
strategy = "fixed"
base_delay_ms = 1
max_delay_ms = 1
"#,
    )
    .unwrap();

    init_tracing();
    let store = Arc::new(InMemoryStore::with_topology(Topology::single_node()));
    let client = KvClient::from_config_file(Arc::clone(&store), &path).unwrap();

    let report = client.upsert("k", &json!(1), &OpOptions::new()).unwrap();
    assert_eq!(
        report.outcome,
        OperationOutcome::DefiniteFailure(FailureKind::DurabilityImpossible)
    );

    // A per-call override still wins
    let report = client
        .upsert(
            "k",
            &json!(1),
            &OpOptions::new().with_durability(DurabilityRequirement::None),
        )
        .unwrap();
    assert!(report.outcome.is_success());
}

#[test]
fn invalid_file_is_rejected_before_any_store_call() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[retry]\nstrategy = \"exponential\"\njitter = 1.5\n").unwrap();

    let store = Arc::new(InMemoryStore::new());
    let err = KvClient::from_config_file(Arc::clone(&store), &path)
        .err()
        .unwrap();
    assert!(matches!(err, Error::InvalidConfiguration(_)));
    assert_eq!(store.stats().total_calls(), 0);
}

#[test]
fn saved_config_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    let config = ClientConfig::default()
        .with_durability(DurabilityRequirement::Observe {
            replicate_to: 1,
            persist_to: 1,
        })
        .with_retry(&fast_policy(4));
    config.write_to_file(&path).unwrap();

    let loaded = ClientConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(
        loaded.durability_requirement().unwrap(),
        DurabilityRequirement::Observe {
            replicate_to: 1,
            persist_to: 1
        }
    );
}
