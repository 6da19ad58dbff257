//! Authorization engine
//!
//! Orchestrates submit, confirm, revoke and execute over a single owned
//! [`WalletState`] aggregate.
//!
//! # Concurrency
//!
//! The aggregate lives behind one mutex; every operation validates and
//! mutates inside a single critical section, so callers only ever observe
//! whole steps. Execution is split in three phases:
//!
//! 1. Under the lock: check preconditions and commit `executed = true`.
//! 2. Without the lock: run the transfer effect. A re-entrant call from the
//!    effect sees the action as executed and is rejected.
//! 3. Under the lock: journal the outcome, or roll `executed` back to false
//!    if the effect failed or panicked. A panic is re-raised after rollback.
//!
//! The effect therefore fires at most once per action.

use crate::confirmations::ConfirmationTracker;
use crate::effect::TransferEffect;
use crate::error::{AuthorizationError, AuthorizationResult};
use crate::journal::{AuditJournal, AuthorizationEvent, JournalEntry, JournalError};
use crate::ledger::{Action, ActionLedger};
use crate::registry::OwnerRegistry;
use quorumvault_core::{ActionId, Amount, Identity, WalletConfig};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Observability counters for the engine
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EngineMetrics {
    pub actions_submitted_total: u64,
    pub confirmations_total: u64,
    pub revocations_total: u64,
    pub executions_total: u64,
    pub execution_failures_total: u64,
    /// Operations refused by a precondition check
    pub rejected_operations_total: u64,
}

/// Owned aggregate of all authorization state
#[derive(Debug)]
pub struct WalletState {
    registry: OwnerRegistry,
    ledger: ActionLedger,
    tracker: ConfirmationTracker,
    journal: AuditJournal,
    metrics: EngineMetrics,
}

/// Snapshot of an action handed to the transfer effect
struct PendingTransfer {
    target: Identity,
    amount: Amount,
    payload: Vec<u8>,
}

impl WalletState {
    pub fn new(registry: OwnerRegistry) -> Self {
        let tracker = ConfirmationTracker::new(registry.owner_count());
        Self {
            registry,
            ledger: ActionLedger::new(),
            tracker,
            journal: AuditJournal::new(),
            metrics: EngineMetrics::default(),
        }
    }

    pub fn registry(&self) -> &OwnerRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &ActionLedger {
        &self.ledger
    }

    pub fn journal(&self) -> &AuditJournal {
        &self.journal
    }

    fn submit(
        &mut self,
        caller: &Identity,
        target: Identity,
        amount: Amount,
        payload: Vec<u8>,
    ) -> AuthorizationResult<ActionId> {
        let action_id = self.ledger.submit(
            &self.registry,
            caller,
            target.clone(),
            amount,
            payload.clone(),
        )?;
        self.tracker.open(action_id);
        self.metrics.actions_submitted_total += 1;
        self.record(AuthorizationEvent::Submitted {
            action_id,
            owner: caller.clone(),
            target,
            amount,
            payload,
        });
        Ok(action_id)
    }

    fn confirm(&mut self, action_id: ActionId, caller: &Identity) -> AuthorizationResult<usize> {
        let confirmations =
            self.tracker
                .confirm(&self.registry, &mut self.ledger, action_id, caller)?;
        self.metrics.confirmations_total += 1;
        self.record(AuthorizationEvent::Confirmed {
            action_id,
            owner: caller.clone(),
            confirmations,
        });
        Ok(confirmations)
    }

    fn revoke(&mut self, action_id: ActionId, caller: &Identity) -> AuthorizationResult<usize> {
        let confirmations =
            self.tracker
                .revoke(&self.registry, &mut self.ledger, action_id, caller)?;
        self.metrics.revocations_total += 1;
        self.record(AuthorizationEvent::Revoked {
            action_id,
            owner: caller.clone(),
            confirmations,
        });
        Ok(confirmations)
    }

    /// Check execute preconditions and commit the executed flag
    fn begin_execution(
        &mut self,
        action_id: ActionId,
        caller: &Identity,
    ) -> AuthorizationResult<PendingTransfer> {
        let required = self.registry.required_confirmations();
        let action = self.ledger.get_mut(action_id)?;
        self.registry.authorize(caller)?;
        if action.executed {
            return Err(AuthorizationError::AlreadyExecuted { action_id });
        }
        if action.confirmation_count < required {
            return Err(AuthorizationError::InsufficientConfirmations {
                action_id,
                got: action.confirmation_count,
                required,
            });
        }

        action.executed = true;
        Ok(PendingTransfer {
            target: action.target.clone(),
            amount: action.amount,
            payload: action.payload.clone(),
        })
    }

    fn finish_execution(&mut self, action_id: ActionId, caller: &Identity, transfer: PendingTransfer) {
        self.metrics.executions_total += 1;
        self.record(AuthorizationEvent::Executed {
            action_id,
            owner: caller.clone(),
            target: transfer.target,
            amount: transfer.amount,
        });
    }

    fn rollback_execution(&mut self, action_id: ActionId, caller: &Identity, reason: String) {
        if let Ok(action) = self.ledger.get_mut(action_id) {
            action.executed = false;
        }
        self.metrics.execution_failures_total += 1;
        self.record(AuthorizationEvent::ExecutionFailed {
            action_id,
            owner: caller.clone(),
            reason,
        });
    }

    fn record(&mut self, event: AuthorizationEvent) {
        let name = event.name();
        let action_id = event.action_id();
        let seq_no = self.journal.append(event);
        debug!(seq_no, action_id, event = name, "Journal entry appended");
    }

    fn reject(&mut self, operation: &'static str, caller: &Identity, err: &AuthorizationError) {
        self.metrics.rejected_operations_total += 1;
        warn!(operation, caller = %caller, kind = ?err.kind(), error = %err, "Operation rejected");
    }
}

/// Threshold-gated authorization engine
///
/// Shareable across threads (wrap in `Arc`); all methods take `&self`.
pub struct AuthorizationEngine<E: TransferEffect> {
    state: Mutex<WalletState>,
    effect: E,
}

impl<E: TransferEffect> AuthorizationEngine<E> {
    /// Create an engine over a validated registry
    pub fn new(registry: OwnerRegistry, effect: E) -> Self {
        info!(
            owners = registry.owner_count(),
            threshold = registry.required_confirmations(),
            "Authorization engine created"
        );
        Self {
            state: Mutex::new(WalletState::new(registry)),
            effect,
        }
    }

    /// Create an engine from the `[wallet]` config section
    ///
    /// Fails with `InvalidConfiguration` on a bad owner list or threshold.
    pub fn from_config(config: &WalletConfig, effect: E) -> AuthorizationResult<Self> {
        let registry = OwnerRegistry::from_config(config)?;
        Ok(Self::new(registry, effect))
    }

    /// Propose a transfer; returns the new action id
    pub fn submit(
        &self,
        caller: &Identity,
        target: Identity,
        amount: Amount,
        payload: Vec<u8>,
    ) -> AuthorizationResult<ActionId> {
        let mut state = self.lock();
        match state.submit(caller, target, amount, payload) {
            Ok(action_id) => {
                info!(action_id, caller = %caller, amount, "Action submitted");
                Ok(action_id)
            }
            Err(err) => {
                state.reject("submit", caller, &err);
                Err(err)
            }
        }
    }

    /// Add the caller's confirmation
    pub fn confirm(&self, action_id: ActionId, caller: &Identity) -> AuthorizationResult<ActionId> {
        let mut state = self.lock();
        match state.confirm(action_id, caller) {
            Ok(confirmations) => {
                info!(action_id, caller = %caller, confirmations, "Action confirmed");
                Ok(action_id)
            }
            Err(err) => {
                state.reject("confirm", caller, &err);
                Err(err)
            }
        }
    }

    /// Withdraw the caller's confirmation
    pub fn revoke(&self, action_id: ActionId, caller: &Identity) -> AuthorizationResult<ActionId> {
        let mut state = self.lock();
        match state.revoke(action_id, caller) {
            Ok(confirmations) => {
                info!(action_id, caller = %caller, confirmations, "Confirmation revoked");
                Ok(action_id)
            }
            Err(err) => {
                state.reject("revoke", caller, &err);
                Err(err)
            }
        }
    }

    /// Execute an action that has reached the threshold
    pub fn execute(&self, action_id: ActionId, caller: &Identity) -> AuthorizationResult<ActionId> {
        let transfer = {
            let mut state = self.lock();
            match state.begin_execution(action_id, caller) {
                Ok(transfer) => transfer,
                Err(err) => {
                    state.reject("execute", caller, &err);
                    return Err(err);
                }
            }
        };

        // Lock released: the effect may call back into the engine
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.effect
                .transfer(&transfer.target, transfer.amount, &transfer.payload)
        }));

        let mut state = self.lock();
        match outcome {
            Ok(Ok(())) => {
                info!(
                    action_id,
                    caller = %caller,
                    target = %transfer.target,
                    amount = transfer.amount,
                    "Action executed"
                );
                state.finish_execution(action_id, caller, transfer);
                Ok(action_id)
            }
            Ok(Err(source)) => {
                warn!(action_id, caller = %caller, error = %source, "Transfer failed, execution rolled back");
                state.rollback_execution(action_id, caller, source.to_string());
                Err(AuthorizationError::ExecutionFailed { action_id, source })
            }
            Err(payload) => {
                error!(action_id, caller = %caller, "Transfer effect panicked, execution rolled back");
                state.rollback_execution(action_id, caller, "transfer effect panicked".to_string());
                drop(state);
                panic::resume_unwind(payload)
            }
        }
    }

    /// Snapshot of an action
    pub fn get(&self, action_id: ActionId) -> AuthorizationResult<Action> {
        self.lock().ledger.get(action_id).cloned()
    }

    pub fn is_confirmed(&self, action_id: ActionId, owner: &Identity) -> AuthorizationResult<bool> {
        let state = self.lock();
        state
            .tracker
            .is_confirmed(&state.registry, &state.ledger, action_id, owner)
    }

    /// Owners currently confirming an action, in registry order
    pub fn confirmed_by(&self, action_id: ActionId) -> AuthorizationResult<Vec<Identity>> {
        let state = self.lock();
        state
            .tracker
            .confirmed_by(&state.registry, &state.ledger, action_id)
    }

    pub fn is_owner(&self, identity: &Identity) -> bool {
        self.lock().registry.is_owner(identity)
    }

    pub fn required_confirmations(&self) -> usize {
        self.lock().registry.required_confirmations()
    }

    pub fn owners(&self) -> Vec<Identity> {
        self.lock().registry.owners().to_vec()
    }

    /// Number of submitted actions
    pub fn action_count(&self) -> usize {
        self.lock().ledger.len()
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.lock().journal.entries().to_vec()
    }

    pub fn verify_journal(&self) -> Result<(), JournalError> {
        self.lock().journal.verify_chain()
    }

    pub fn metrics(&self) -> EngineMetrics {
        self.lock().metrics.clone()
    }

    /// The transfer effect this engine drives
    pub fn effect(&self) -> &E {
        &self.effect
    }

    /// Run a read-only closure against the whole state under one lock
    pub fn with_state<R>(&self, f: impl FnOnce(&WalletState) -> R) -> R {
        f(&self.lock())
    }

    // Every critical section validates before it mutates, and execute rolls
    // back around a panicking effect, so a poisoned lock holds whole steps.
    fn lock(&self) -> MutexGuard<'_, WalletState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
