//! External value-transfer effect invoked on execution

use crate::error::TransferError;
use quorumvault_core::{Amount, Identity};
use std::sync::Arc;

/// Performs the transfer of an executed action
///
/// Called synchronously by the engine after the action has been marked
/// executed and outside the engine's state lock, so an implementation may
/// call back into the engine. Any error rolls the executed flag back.
pub trait TransferEffect: Send + Sync {
    /// Move `amount` to `target`, carrying `payload`
    fn transfer(&self, target: &Identity, amount: Amount, payload: &[u8])
        -> Result<(), TransferError>;
}

impl<T: TransferEffect + ?Sized> TransferEffect for Arc<T> {
    fn transfer(
        &self,
        target: &Identity,
        amount: Amount,
        payload: &[u8],
    ) -> Result<(), TransferError> {
        (**self).transfer(target, amount, payload)
    }
}
