//! In-memory treasury
//!
//! Reference [`TransferEffect`] holding the wallet's vault balance and the
//! balances of external accounts. Deposits credit the vault; executed
//! actions move value from the vault to their target.

use crate::effect::TransferEffect;
use crate::error::TransferError;
use quorumvault_core::{Amount, Identity};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Value received by the vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Depositing identity
    pub from: Identity,
    /// Deposited value
    pub amount: Amount,
    /// Vault balance after the deposit
    pub vault_balance: Amount,
}

/// Completed transfer out of the vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Recipient
    pub target: Identity,
    /// Transferred value
    pub amount: Amount,
    /// Payload delivered with the transfer
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct TreasuryState {
    vault: Amount,
    balances: HashMap<Identity, Amount>,
    rejecting: HashSet<Identity>,
    deposits: Vec<Deposit>,
    transfers: Vec<TransferRecord>,
}

/// Vault plus external account balances
#[derive(Debug, Default)]
pub struct InMemoryTreasury {
    state: RwLock<TreasuryState>,
}

impl InMemoryTreasury {
    /// Create an empty treasury
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a treasury with pre-funded external accounts
    pub fn with_balances(balances: impl IntoIterator<Item = (Identity, Amount)>) -> Self {
        let treasury = Self::new();
        treasury.write().balances.extend(balances);
        treasury
    }

    /// Credit the vault; returns the new vault balance
    pub fn deposit(&self, from: &Identity, amount: Amount) -> Result<Amount, TransferError> {
        let mut state = self.write();
        let vault_balance = state
            .vault
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(from.clone()))?;
        state.vault = vault_balance;
        state.deposits.push(Deposit {
            from: from.clone(),
            amount,
            vault_balance,
        });

        info!(from = %from, amount, vault_balance, "Deposit received");
        Ok(vault_balance)
    }

    /// Make every future transfer to `target` fail
    pub fn reject_transfers_to(&self, target: Identity) {
        self.write().rejecting.insert(target);
    }

    /// Undo [`reject_transfers_to`](Self::reject_transfers_to)
    pub fn accept_transfers_to(&self, target: &Identity) {
        self.write().rejecting.remove(target);
    }

    pub fn vault_balance(&self) -> Amount {
        self.read().vault
    }

    /// Balance of an external account (0 if unknown)
    pub fn balance_of(&self, identity: &Identity) -> Amount {
        self.read().balances.get(identity).copied().unwrap_or(0)
    }

    pub fn deposits(&self) -> Vec<Deposit> {
        self.read().deposits.clone()
    }

    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.read().transfers.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, TreasuryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreasuryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransferEffect for InMemoryTreasury {
    fn transfer(
        &self,
        target: &Identity,
        amount: Amount,
        payload: &[u8],
    ) -> Result<(), TransferError> {
        let mut state = self.write();

        if state.rejecting.contains(target) {
            warn!(target = %target, amount, "Recipient rejected transfer");
            return Err(TransferError::RecipientRejected(target.clone()));
        }

        if state.vault < amount {
            warn!(available = state.vault, requested = amount, "Vault cannot cover transfer");
            return Err(TransferError::InsufficientFunds {
                available: state.vault,
                requested: amount,
            });
        }

        let current = state.balances.get(target).copied().unwrap_or(0);
        let credited = current
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(target.clone()))?;

        state.vault -= amount;
        state.balances.insert(target.clone(), credited);
        state.transfers.push(TransferRecord {
            target: target.clone(),
            amount,
            payload: payload.to_vec(),
        });

        debug!(target = %target, amount, payload_len = payload.len(), "Transfer completed");
        Ok(())
    }
}
