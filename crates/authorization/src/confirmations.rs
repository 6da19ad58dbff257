//! Confirmation tracker
//!
//! Records which owners currently confirm each action. Each action gets a
//! bitset sized to the owner count, indexed by the owner's registry
//! position. The ledger's `confirmation_count` is a cache of the bitset
//! population and is updated in the same step as the bit.

use crate::error::{AuthorizationError, AuthorizationResult};
use crate::ledger::ActionLedger;
use crate::registry::OwnerRegistry;
use quorumvault_core::{ActionId, Identity};

const WORD_BITS: usize = 64;

/// Fixed-size bitset of confirming owners
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationSet {
    words: Vec<u64>,
}

impl ConfirmationSet {
    /// Create an empty set able to hold `owner_count` owners
    pub fn with_owner_count(owner_count: usize) -> Self {
        Self {
            words: vec![0; (owner_count + WORD_BITS - 1) / WORD_BITS],
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .map_or(false, |word| word & (1u64 << (index % WORD_BITS)) != 0)
    }

    /// Set the bit; returns `false` if it was already set
    pub fn insert(&mut self, index: usize) -> bool {
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        let newly_set = *word & mask == 0;
        *word |= mask;
        newly_set
    }

    /// Clear the bit; returns `false` if it was not set
    pub fn remove(&mut self, index: usize) -> bool {
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        let was_set = *word & mask != 0;
        *word &= !mask;
        was_set
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Indices of set bits in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| w * WORD_BITS + bit)
        })
    }
}

/// Per-action confirmation state, parallel to the action ledger
#[derive(Debug)]
pub struct ConfirmationTracker {
    sets: Vec<ConfirmationSet>,
    owner_count: usize,
}

impl ConfirmationTracker {
    pub fn new(owner_count: usize) -> Self {
        Self {
            sets: Vec::new(),
            owner_count,
        }
    }

    /// Open an all-false record set for a freshly submitted action
    pub(crate) fn open(&mut self, action_id: ActionId) {
        debug_assert_eq!(action_id as usize, self.sets.len());
        self.sets
            .push(ConfirmationSet::with_owner_count(self.owner_count));
    }

    /// Record `caller`'s confirmation; returns the new confirmation count
    ///
    /// Checks, first failure wins: action exists, caller is an owner, action
    /// not executed, caller has not already confirmed.
    pub(crate) fn confirm(
        &mut self,
        registry: &OwnerRegistry,
        ledger: &mut ActionLedger,
        action_id: ActionId,
        caller: &Identity,
    ) -> AuthorizationResult<usize> {
        let action = ledger.get_mut(action_id)?;
        let index = registry.authorize(caller)?;
        if action.executed {
            return Err(AuthorizationError::AlreadyExecuted { action_id });
        }

        let set = Self::set_mut(&mut self.sets, action_id)?;
        if set.contains(index) {
            return Err(AuthorizationError::AlreadyConfirmed {
                action_id,
                owner: caller.clone(),
            });
        }

        set.insert(index);
        action.confirmation_count += 1;
        debug_assert_eq!(action.confirmation_count, set.len());
        Ok(action.confirmation_count)
    }

    /// Withdraw `caller`'s confirmation; returns the new confirmation count
    ///
    /// Allowed at any point before execution, including after the threshold
    /// has been reached.
    pub(crate) fn revoke(
        &mut self,
        registry: &OwnerRegistry,
        ledger: &mut ActionLedger,
        action_id: ActionId,
        caller: &Identity,
    ) -> AuthorizationResult<usize> {
        let action = ledger.get_mut(action_id)?;
        let index = registry.authorize(caller)?;
        if action.executed {
            return Err(AuthorizationError::AlreadyExecuted { action_id });
        }

        let set = Self::set_mut(&mut self.sets, action_id)?;
        if !set.remove(index) {
            return Err(AuthorizationError::NotConfirmed {
                action_id,
                owner: caller.clone(),
            });
        }

        action.confirmation_count -= 1;
        debug_assert_eq!(action.confirmation_count, set.len());
        Ok(action.confirmation_count)
    }

    /// Whether `identity` currently confirms the action
    pub fn is_confirmed(
        &self,
        registry: &OwnerRegistry,
        ledger: &ActionLedger,
        action_id: ActionId,
        identity: &Identity,
    ) -> AuthorizationResult<bool> {
        ledger.get(action_id)?;
        let set = self.set(action_id)?;
        Ok(registry
            .index_of(identity)
            .map_or(false, |index| set.contains(index)))
    }

    /// Owners currently confirming the action, in registry order
    pub fn confirmed_by(
        &self,
        registry: &OwnerRegistry,
        ledger: &ActionLedger,
        action_id: ActionId,
    ) -> AuthorizationResult<Vec<Identity>> {
        ledger.get(action_id)?;
        let owners = registry.owners();
        Ok(self
            .set(action_id)?
            .iter()
            .filter_map(|index| owners.get(index).cloned())
            .collect())
    }

    fn set(&self, action_id: ActionId) -> AuthorizationResult<&ConfirmationSet> {
        self.sets
            .get(action_id as usize)
            .ok_or(AuthorizationError::NotFound { action_id })
    }

    fn set_mut(
        sets: &mut [ConfirmationSet],
        action_id: ActionId,
    ) -> AuthorizationResult<&mut ConfirmationSet> {
        sets.get_mut(action_id as usize)
            .ok_or(AuthorizationError::NotFound { action_id })
    }
}
