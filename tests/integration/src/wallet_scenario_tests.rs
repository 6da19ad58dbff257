//! Wallet lifecycle scenarios
//!
//! Owners {alice, bob, carl}, threshold 2, with alice submitting a
//! 100-unit transfer to carl, walked through submit, confirm, revoke and
//! execute.

use crate::test_utils::*;
use proptest::prelude::*;
use quorumvault_authorization::{verify_entries, ActionStatus, AuthorizationError, ErrorKind};
use quorumvault_core::Identity;

#[test]
fn test_registry_exposed_through_engine() {
    let wallet = TestWallet::new(2);

    assert_eq!(wallet.engine.owners(), vec![alice(), bob(), carl()]);
    for owner in wallet.engine.owners() {
        assert!(wallet.engine.is_owner(&owner));
    }
    assert!(!wallet.engine.is_owner(&ivan()));
    assert_eq!(wallet.engine.required_confirmations(), 2);
}

#[test]
fn test_submit_stores_action_verbatim() {
    let wallet = TestWallet::new(2);
    let id = wallet.engine.submit(&alice(), carl(), 100, Vec::new()).unwrap();

    let action = wallet.engine.get(id).unwrap();
    assert_eq!(id, 0);
    assert_eq!(action.target, carl());
    assert_eq!(action.amount, 100);
    assert!(action.payload.is_empty());
    assert!(!action.executed);
    assert_eq!(action.confirmation_count, 0);
    assert_eq!(action.status(), ActionStatus::Pending);
}

#[test]
fn test_submit_by_non_owner_rejected() {
    let wallet = TestWallet::new(2);

    let err = wallet
        .engine
        .submit(&ivan(), carl(), 100, Vec::new())
        .unwrap_err();
    assert!(matches!(err, AuthorizationError::Unauthorized { ref caller } if *caller == ivan()));
    assert_eq!(wallet.engine.action_count(), 0);
    assert!(wallet.engine.journal().is_empty());
}

#[test]
fn test_confirm_execute_scenario() {
    let wallet = TestWallet::new(2);
    let id = wallet.funded_action(100);
    assert_eq!(wallet.treasury.vault_balance(), 100);

    wallet.engine.confirm(id, &alice()).unwrap();
    assert_eq!(wallet.engine.get(id).unwrap().confirmation_count, 1);
    assert!(wallet.engine.is_confirmed(id, &alice()).unwrap());

    assert_eq!(
        wallet.engine.confirm(1, &alice()).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        wallet.engine.confirm(id, &alice()).unwrap_err().kind(),
        ErrorKind::AlreadyConfirmed
    );
    assert_eq!(wallet.engine.get(id).unwrap().confirmation_count, 1);

    wallet.engine.confirm(id, &bob()).unwrap();
    assert_eq!(wallet.engine.get(id).unwrap().confirmation_count, 2);

    wallet.engine.execute(id, &alice()).unwrap();
    let action = wallet.engine.get(id).unwrap();
    assert!(action.executed);
    assert_eq!(action.status(), ActionStatus::Executed);
    assert_eq!(wallet.treasury.vault_balance(), 0);
    assert_eq!(wallet.treasury.balance_of(&carl()), STARTING_BALANCE + 100);

    assert_eq!(
        wallet.engine.execute(id, &alice()).unwrap_err().kind(),
        ErrorKind::AlreadyExecuted
    );
    assert_eq!(wallet.treasury.transfers().len(), 1);
}

#[test]
fn test_confirm_after_execution_blocked() {
    let wallet = TestWallet::new(2);
    let id = wallet.funded_action(100);
    wallet.engine.confirm(id, &alice()).unwrap();
    wallet.engine.confirm(id, &bob()).unwrap();
    wallet.engine.execute(id, &bob()).unwrap();

    assert_eq!(
        wallet.engine.confirm(id, &carl()).unwrap_err().kind(),
        ErrorKind::AlreadyExecuted
    );
    assert!(!wallet.engine.is_confirmed(id, &carl()).unwrap());
    assert_eq!(wallet.engine.get(id).unwrap().confirmation_count, 2);
}

#[test]
fn test_revoke_then_reconfirm() {
    let wallet = TestWallet::new(2);
    let id = wallet.funded_action(100);

    wallet.engine.confirm(id, &alice()).unwrap();
    wallet.engine.revoke(id, &alice()).unwrap();

    assert_eq!(wallet.engine.get(id).unwrap().confirmation_count, 0);
    assert!(!wallet.engine.is_confirmed(id, &alice()).unwrap());

    assert_eq!(
        wallet.engine.revoke(id, &alice()).unwrap_err().kind(),
        ErrorKind::NotConfirmed
    );

    wallet.engine.confirm(id, &alice()).unwrap();
    assert!(wallet.engine.is_confirmed(id, &alice()).unwrap());
    assert_eq!(wallet.engine.get(id).unwrap().confirmation_count, 1);
}

#[test]
fn test_revoke_after_threshold_blocks_execution() {
    let wallet = TestWallet::new(2);
    let id = wallet.funded_action(100);
    wallet.engine.confirm(id, &alice()).unwrap();
    wallet.engine.confirm(id, &bob()).unwrap();

    wallet.engine.revoke(id, &bob()).unwrap();

    assert!(matches!(
        wallet.engine.execute(id, &alice()),
        Err(AuthorizationError::InsufficientConfirmations {
            got: 1,
            required: 2,
            ..
        })
    ));
    assert_eq!(wallet.treasury.vault_balance(), 100);

    wallet.engine.confirm(id, &carl()).unwrap();
    wallet.engine.execute(id, &alice()).unwrap();
    assert_eq!(wallet.engine.confirmed_by(id).unwrap(), vec![alice(), carl()]);
}

#[test]
fn test_revoke_by_non_owner_rejected() {
    let wallet = TestWallet::new(2);
    let id = wallet.funded_action(100);

    assert_eq!(
        wallet.engine.revoke(id, &ivan()).unwrap_err().kind(),
        ErrorKind::Unauthorized
    );
    assert_eq!(
        wallet.engine.revoke(9, &alice()).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_ids_are_sequential_and_independent() {
    let wallet = TestWallet::new(1);
    let first = wallet.engine.submit(&alice(), carl(), 1, Vec::new()).unwrap();
    let second = wallet.engine.submit(&bob(), alice(), 2, b"memo".to_vec()).unwrap();
    let third = wallet.engine.submit(&carl(), bob(), 3, Vec::new()).unwrap();
    assert_eq!((first, second, third), (0, 1, 2));

    wallet.engine.confirm(second, &carl()).unwrap();
    assert_eq!(wallet.engine.get(first).unwrap().confirmation_count, 0);
    assert_eq!(wallet.engine.get(second).unwrap().confirmation_count, 1);
    assert_eq!(wallet.engine.get(second).unwrap().payload, b"memo".to_vec());
    assert_eq!(wallet.engine.action_count(), 3);
}

#[test]
fn test_journal_records_lifecycle() {
    let wallet = TestWallet::new(2);
    let id = wallet.funded_action(100);
    wallet.engine.confirm(id, &alice()).unwrap();
    wallet.engine.revoke(id, &alice()).unwrap();
    wallet.engine.confirm(id, &alice()).unwrap();
    wallet.engine.confirm(id, &bob()).unwrap();
    wallet.engine.execute(id, &carl()).unwrap();

    let journal = wallet.engine.journal();
    let names: Vec<_> = journal.iter().map(|e| e.event.name()).collect();
    assert_eq!(
        names,
        vec!["submitted", "confirmed", "revoked", "confirmed", "confirmed", "executed"]
    );
    assert!(journal.iter().all(|e| e.event.action_id() == id));
    assert!(wallet.engine.verify_journal().is_ok());

    // Exported journal survives a JSON round trip and still verifies
    let exported = serde_json::to_string(&journal).unwrap();
    let imported: Vec<quorumvault_authorization::JournalEntry> =
        serde_json::from_str(&exported).unwrap();
    assert!(verify_entries(&imported).is_ok());
}

#[test]
fn test_state_views_follow_engine_mutations() {
    let wallet = TestWallet::new(2);
    let id = wallet.funded_action(100);
    wallet.engine.confirm(id, &bob()).unwrap();

    // Ledger and registry are only readable from outside; the engine mutates them
    let (len, count, bob_index) = wallet.engine.with_state(|state| {
        (
            state.ledger().len(),
            state.ledger().get(id).unwrap().confirmation_count,
            state.registry().index_of(&bob()),
        )
    });
    assert_eq!(len, 1);
    assert_eq!(count, 1);
    assert_eq!(bob_index, Some(1));
    assert_eq!(wallet.engine.confirmed_by(id).unwrap(), vec![bob()]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn execute_succeeds_iff_threshold_reached(
        threshold in 1usize..=3,
        confirmers in prop::sample::subsequence(vec![0usize, 1, 2], 0..=3),
    ) {
        let wallet = TestWallet::new(threshold);
        let id = wallet.funded_action(100);
        let owners = [alice(), bob(), carl()];

        for index in &confirmers {
            wallet.engine.confirm(id, &owners[*index]).unwrap();
        }
        prop_assert_eq!(wallet.engine.get(id).unwrap().confirmation_count, confirmers.len());

        let executor: Identity = owners[0].clone();
        let result = wallet.engine.execute(id, &executor);
        prop_assert_eq!(result.is_ok(), confirmers.len() >= threshold);
        prop_assert_eq!(wallet.engine.get(id).unwrap().executed, confirmers.len() >= threshold);
        let expected_vault = if confirmers.len() >= threshold { 0 } else { 100 };
        prop_assert_eq!(wallet.treasury.vault_balance(), expected_vault);
    }
}
