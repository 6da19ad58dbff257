//! Concurrent callers against a shared engine
//!
//! Every operation is one critical section, so racing threads must produce
//! the same end state as some serial ordering.

use crate::test_utils::*;
use quorumvault_authorization::{AuthorizationEngine, ErrorKind, InMemoryTreasury, OwnerRegistry};
use quorumvault_core::Identity;
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn owners(count: usize) -> Vec<Identity> {
    (0..count).map(|i| Identity::new(format!("owner-{i}"))).collect()
}

fn shared_engine(
    owner_count: usize,
    threshold: usize,
) -> (Arc<AuthorizationEngine<Arc<InMemoryTreasury>>>, Arc<InMemoryTreasury>) {
    init_tracing();
    let treasury = Arc::new(InMemoryTreasury::new());
    let registry = OwnerRegistry::new(owners(owner_count), threshold).unwrap();
    let engine = Arc::new(AuthorizationEngine::new(registry, Arc::clone(&treasury)));
    (engine, treasury)
}

#[test]
fn test_concurrent_confirms_all_counted() {
    let (engine, _) = shared_engine(16, 9);
    let id = engine
        .submit(&Identity::new("owner-0"), carl(), 1, Vec::new())
        .unwrap();

    let barrier = Arc::new(Barrier::new(16));
    let handles: Vec<_> = owners(16)
        .into_iter()
        .map(|owner| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.confirm(id, &owner)
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(engine.get(id).unwrap().confirmation_count, 16);
    assert_eq!(engine.confirmed_by(id).unwrap(), owners(16));
    assert_eq!(engine.metrics().confirmations_total, 16);
}

#[test]
fn test_racing_executions_fire_once() {
    let (engine, treasury) = shared_engine(8, 3);
    treasury.deposit(&alice(), 500).unwrap();
    let all = owners(8);
    let id = engine.submit(&all[0], carl(), 500, Vec::new()).unwrap();
    for owner in &all[..3] {
        engine.confirm(id, owner).unwrap();
    }

    let barrier = Arc::new(Barrier::new(all.len()));
    let handles: Vec<_> = all
        .into_iter()
        .map(|owner| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.execute(id, &owner).map_err(|e| e.kind())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.err())
        .all(|kind| kind == ErrorKind::AlreadyExecuted));

    assert_eq!(treasury.transfers().len(), 1);
    assert_eq!(treasury.vault_balance(), 0);
    assert_eq!(treasury.balance_of(&carl()), 500);
    assert_eq!(engine.metrics().executions_total, 1);
}

#[test]
fn test_concurrent_submits_get_unique_ids() {
    let (engine, _) = shared_engine(4, 2);
    let per_thread = 25;

    let handles: Vec<_> = owners(4)
        .into_iter()
        .map(|owner| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..per_thread)
                    .map(|i| engine.submit(&owner, carl(), i, Vec::new()).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: BTreeSet<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let expected: BTreeSet<u64> = (0..(4 * per_thread) as u64).collect();
    assert_eq!(ids, expected);
    assert_eq!(engine.action_count(), 100);
    assert!(engine.verify_journal().is_ok());
}

#[test]
fn test_confirm_revoke_churn_keeps_count_consistent() {
    let (engine, _) = shared_engine(6, 4);
    let id = engine
        .submit(&Identity::new("owner-0"), carl(), 1, Vec::new())
        .unwrap();

    let handles: Vec<_> = owners(6)
        .into_iter()
        .enumerate()
        .map(|(index, owner)| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..50 {
                    engine.confirm(id, &owner).unwrap();
                    engine.revoke(id, &owner).unwrap();
                }
                // Even-indexed owners finish confirmed
                if index % 2 == 0 {
                    engine.confirm(id, &owner).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let confirmed = engine.confirmed_by(id).unwrap();
    assert_eq!(confirmed.len(), 3);
    assert_eq!(engine.get(id).unwrap().confirmation_count, confirmed.len());
    assert_eq!(
        engine.execute(id, &Identity::new("owner-1")).unwrap_err().kind(),
        ErrorKind::InsufficientConfirmations
    );
    assert!(engine.verify_journal().is_ok());
}
