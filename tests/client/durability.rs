//! Durability-aware write tests
//!
//! Outcome mapping for each durability level against healthy, degraded and
//! single-node topologies.

use crate::common::*;
use durakv::{
    DocumentStore, DurabilityRequirement, Error, FailureKind, Fault, InMemoryStore, OpOptions,
    OperationOutcome, StoreOp, Topology,
};
use serde_json::json;
use std::sync::Arc;

const SYNC_LEVELS: [DurabilityRequirement; 3] = [
    DurabilityRequirement::Majority,
    DurabilityRequirement::MajorityAndPersistToActive,
    DurabilityRequirement::PersistToMajority,
];

#[test]
fn persist_to_majority_on_single_node_fails_definitely() {
    let store = Arc::new(InMemoryStore::with_topology(Topology::single_node()));
    let client = client_over(Arc::clone(&store), 5);

    let outcome = client
        .write_with_durability(
            "doc",
            &json!({"k": "v"}),
            DurabilityRequirement::PersistToMajority,
        )
        .unwrap();

    assert_eq!(
        outcome,
        OperationOutcome::DefiniteFailure(FailureKind::DurabilityImpossible)
    );
    // One store call, no retry, nothing written
    assert_eq!(store.stats().total_calls(), 1);
    assert!(store.is_empty());
}

#[test]
fn every_sync_level_succeeds_on_healthy_replicas() {
    let store = replicated_store();
    let client = client_over(Arc::clone(&store), 3);

    for (i, level) in SYNC_LEVELS.into_iter().enumerate() {
        let key = format!("doc:{i}");
        let outcome = client
            .write_with_durability(&key, &json!(i), level)
            .unwrap();
        let cas = outcome.cas().unwrap_or_else(|| panic!("{level}: {outcome}"));
        assert_eq!(store.get(&crate::common::key(&key)).unwrap().cas, cas);
    }
}

#[test]
fn lost_majority_is_impossible_until_replicas_return() {
    let store = replicated_store();
    let client = client_over(Arc::clone(&store), 3);

    store.set_topology(Topology {
        live_replicas: 0,
        ..Topology::with_replicas(2)
    });
    let outcome = client
        .write_with_durability("doc", &json!(1), DurabilityRequirement::Majority)
        .unwrap();
    assert_eq!(
        outcome,
        OperationOutcome::DefiniteFailure(FailureKind::DurabilityImpossible)
    );

    store.set_topology(Topology::with_replicas(2));
    let outcome = client
        .write_with_durability("doc", &json!(1), DurabilityRequirement::Majority)
        .unwrap();
    assert!(outcome.is_success());
}

#[test]
fn three_replicas_reject_sync_durability() {
    let store = Arc::new(InMemoryStore::with_topology(Topology::with_replicas(3)));
    let client = client_over(Arc::clone(&store), 3);

    for level in SYNC_LEVELS {
        let outcome = client
            .write_with_durability("doc", &json!(1), level)
            .unwrap();
        assert_eq!(
            outcome,
            OperationOutcome::DefiniteFailure(FailureKind::DurabilityImpossible),
            "{level}"
        );
    }

    // Observe durability still works there
    let outcome = client
        .write_with_durability(
            "doc",
            &json!(1),
            DurabilityRequirement::Observe {
                replicate_to: 3,
                persist_to: 4,
            },
        )
        .unwrap();
    assert!(outcome.is_success());
}

#[test]
fn observe_requirements_against_single_node() {
    let store = Arc::new(InMemoryStore::with_topology(Topology::single_node()));
    let client = client_over(Arc::clone(&store), 3);

    let persist_active_only = DurabilityRequirement::Observe {
        replicate_to: 0,
        persist_to: 1,
    };
    assert!(client
        .write_with_durability("doc", &json!(1), persist_active_only)
        .unwrap()
        .is_success());

    let needs_replica = DurabilityRequirement::Observe {
        replicate_to: 0,
        persist_to: 2,
    };
    assert_eq!(
        client
            .write_with_durability("doc", &json!(1), needs_replica)
            .unwrap(),
        OperationOutcome::DefiniteFailure(FailureKind::ReplicaNotConfigured)
    );
}

#[test]
fn ambiguous_write_is_reported_not_retried() {
    let store = replicated_store();
    store
        .faults()
        .push(StoreOp::Upsert, Fault::Ambiguous { applied: true }, 1);
    let client = client_over(Arc::clone(&store), 5);

    let report = client
        .upsert(
            "doc",
            &json!("v"),
            &OpOptions::new().with_durability(DurabilityRequirement::PersistToMajority),
        )
        .unwrap();

    assert_eq!(report.outcome, OperationOutcome::AmbiguousDurability);
    assert_eq!(report.attempts, 1);
    assert_eq!(store.stats().upserts, 1);
    // The write did land; only the caller can decide what that means
    assert_eq!(store.history(&key("doc")).len(), 1);
}

#[test]
fn transient_write_failures_are_retried() {
    for kind in TRANSIENT {
        let store = replicated_store();
        store.faults().push(StoreOp::Upsert, Fault::Fail(kind.clone()), 2);
        let client = client_over(Arc::clone(&store), 3);

        let report = client
            .upsert("doc", &json!(1), &OpOptions::new())
            .unwrap();
        assert!(report.outcome.is_success(), "{kind}");
        assert_eq!(report.attempts, 3);

        store.faults().push(StoreOp::Upsert, Fault::Fail(kind.clone()), 3);
        let report = client
            .upsert("doc", &json!(2), &OpOptions::new())
            .unwrap();
        assert_eq!(
            report.outcome,
            OperationOutcome::RetriesExhausted {
                attempts: 3,
                last: kind
            }
        );
    }
}

#[test]
fn invalid_requirement_makes_no_store_call() {
    let store = replicated_store();
    let client = client_over(Arc::clone(&store), 3);

    let err = client
        .write_with_durability(
            "doc",
            &json!(1),
            DurabilityRequirement::Observe {
                replicate_to: 9,
                persist_to: 0,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));

    let err = client
        .upsert("", &json!(1), &OpOptions::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));

    assert_eq!(store.stats().total_calls(), 0);
}

#[test]
fn oversized_document_is_definite() {
    let store = replicated_store();
    let client = client_over(Arc::clone(&store), 3);
    let big = "x".repeat(durakv_core::MAX_DOCUMENT_SIZE);

    let report = client.insert("big", &big, &OpOptions::new()).unwrap();
    assert_eq!(
        report.outcome,
        OperationOutcome::DefiniteFailure(FailureKind::ValueTooLarge)
    );
    assert_eq!(report.attempts, 1);
}
