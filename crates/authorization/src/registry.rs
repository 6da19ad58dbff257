//! Owner registry
//!
//! Holds the fixed set of owners allowed to submit, confirm, revoke and
//! execute actions, together with the confirmation threshold. The registry is
//! validated once at construction and never changes afterwards.

use crate::error::{AuthorizationError, AuthorizationResult};
use quorumvault_core::{Identity, WalletConfig};
use std::collections::HashMap;

/// Fixed owner set and confirmation threshold
#[derive(Debug, Clone)]
pub struct OwnerRegistry {
    /// Owners in construction order
    owners: Vec<Identity>,
    /// Owner -> position in `owners`, used as the confirmation bit index
    index: HashMap<Identity, usize>,
    /// Confirmations required before execution
    threshold: usize,
}

impl OwnerRegistry {
    /// Create a registry
    ///
    /// Fails with `InvalidConfiguration` if `owners` is empty, contains
    /// duplicates, or `threshold` is outside `1..=owners.len()`.
    pub fn new(owners: Vec<Identity>, threshold: usize) -> AuthorizationResult<Self> {
        if owners.is_empty() {
            return Err(AuthorizationError::InvalidConfiguration(
                "owner list is empty".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(owners.len());
        for (position, owner) in owners.iter().enumerate() {
            if index.insert(owner.clone(), position).is_some() {
                return Err(AuthorizationError::InvalidConfiguration(format!(
                    "duplicate owner: {}",
                    owner
                )));
            }
        }

        if threshold == 0 || threshold > owners.len() {
            return Err(AuthorizationError::InvalidConfiguration(format!(
                "threshold {} out of range 1..={}",
                threshold,
                owners.len()
            )));
        }

        Ok(Self {
            owners,
            index,
            threshold,
        })
    }

    /// Build a registry from the `[wallet]` config section
    pub fn from_config(config: &WalletConfig) -> AuthorizationResult<Self> {
        Self::new(config.owners.clone(), config.threshold)
    }

    /// Check if an identity is a registered owner
    pub fn is_owner(&self, identity: &Identity) -> bool {
        self.index.contains_key(identity)
    }

    /// Number of confirmations required to execute
    pub fn required_confirmations(&self) -> usize {
        self.threshold
    }

    /// Owners in construction order
    pub fn owners(&self) -> &[Identity] {
        &self.owners
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Position of an owner, `None` for non-owners
    pub fn index_of(&self, identity: &Identity) -> Option<usize> {
        self.index.get(identity).copied()
    }

    /// Position of the caller, or `Unauthorized`
    pub(crate) fn authorize(&self, caller: &Identity) -> AuthorizationResult<usize> {
        self.index_of(caller)
            .ok_or_else(|| AuthorizationError::Unauthorized {
                caller: caller.clone(),
            })
    }
}
