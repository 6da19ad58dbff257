//! Action ledger
//!
//! Append-only store of every submitted action. Identifiers are assigned
//! sequentially from 0 and never reused; actions are never deleted.

use crate::error::{AuthorizationError, AuthorizationResult};
use crate::registry::OwnerRegistry;
use quorumvault_core::{ActionId, Amount, Identity};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    /// Awaiting confirmations or execution
    Pending,
    /// Terminal: the transfer has been performed
    Executed,
}

/// A proposed transfer awaiting authorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Sequential identifier
    pub id: ActionId,
    /// Transfer recipient
    pub target: Identity,
    /// Value to move on execution
    pub amount: Amount,
    /// Opaque data carried with the transfer
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
    /// Whether the action has been executed
    pub executed: bool,
    /// Cached number of owners currently confirming
    pub confirmation_count: usize,
}

impl Action {
    /// Get the lifecycle status
    pub fn status(&self) -> ActionStatus {
        if self.executed {
            ActionStatus::Executed
        } else {
            ActionStatus::Pending
        }
    }
}

/// Append-only action store
#[derive(Debug, Default)]
pub struct ActionLedger {
    actions: Vec<Action>,
}

impl ActionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new pending action
    ///
    /// Target, amount and payload are stored verbatim; reachability and
    /// affordability are only discovered when the action executes.
    pub(crate) fn submit(
        &mut self,
        registry: &OwnerRegistry,
        caller: &Identity,
        target: Identity,
        amount: Amount,
        payload: Vec<u8>,
    ) -> AuthorizationResult<ActionId> {
        registry.authorize(caller)?;

        let id = self.actions.len() as ActionId;
        self.actions.push(Action {
            id,
            target,
            amount,
            payload,
            executed: false,
            confirmation_count: 0,
        });

        Ok(id)
    }

    /// Look up an action
    pub fn get(&self, action_id: ActionId) -> AuthorizationResult<&Action> {
        usize::try_from(action_id)
            .ok()
            .and_then(|index| self.actions.get(index))
            .ok_or(AuthorizationError::NotFound { action_id })
    }

    pub(crate) fn get_mut(&mut self, action_id: ActionId) -> AuthorizationResult<&mut Action> {
        usize::try_from(action_id)
            .ok()
            .and_then(|index| self.actions.get_mut(index))
            .ok_or(AuthorizationError::NotFound { action_id })
    }

    /// Number of submitted actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}
