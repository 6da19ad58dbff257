//! Error types for the authorization engine and the transfer effect

use quorumvault_core::{ActionId, Amount, Identity};
use serde::Serialize;
use thiserror::Error;

/// Authorization errors
///
/// Every variant is raised before any state is touched, except
/// `ExecutionFailed`, whose executed flag has already been rolled back by the
/// time the caller sees it.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// Bad owner list or threshold at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Caller is not a registered owner
    #[error("Unauthorized: {caller} is not an owner")]
    Unauthorized {
        /// Rejected caller
        caller: Identity,
    },

    /// Referenced action does not exist
    #[error("Action not found: {action_id}")]
    NotFound {
        /// Requested action id
        action_id: ActionId,
    },

    /// Mutating operation attempted on an executed action
    #[error("Action {action_id} already executed")]
    AlreadyExecuted {
        /// Action identifier
        action_id: ActionId,
    },

    /// Owner has already confirmed this action
    #[error("Action {action_id} already confirmed by {owner}")]
    AlreadyConfirmed {
        /// Action identifier
        action_id: ActionId,
        /// Confirming owner
        owner: Identity,
    },

    /// Owner has no active confirmation to revoke
    #[error("Action {action_id} not confirmed by {owner}")]
    NotConfirmed {
        /// Action identifier
        action_id: ActionId,
        /// Revoking owner
        owner: Identity,
    },

    /// Threshold not reached yet
    #[error("Insufficient confirmations for action {action_id}: got {got}, required {required}")]
    InsufficientConfirmations {
        /// Action identifier
        action_id: ActionId,
        /// Confirmations currently held
        got: usize,
        /// Confirmations required by the registry
        required: usize,
    },

    /// The transfer effect failed and the executed flag was rolled back
    #[error("Execution of action {action_id} failed: {source}")]
    ExecutionFailed {
        /// Action identifier
        action_id: ActionId,
        /// Underlying transfer failure
        #[source]
        source: TransferError,
    },
}

/// Fieldless error discriminant, for matching and wire output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidConfiguration,
    Unauthorized,
    NotFound,
    AlreadyExecuted,
    AlreadyConfirmed,
    NotConfirmed,
    InsufficientConfirmations,
    ExecutionFailed,
}

impl AuthorizationError {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthorizationError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            AuthorizationError::Unauthorized { .. } => ErrorKind::Unauthorized,
            AuthorizationError::NotFound { .. } => ErrorKind::NotFound,
            AuthorizationError::AlreadyExecuted { .. } => ErrorKind::AlreadyExecuted,
            AuthorizationError::AlreadyConfirmed { .. } => ErrorKind::AlreadyConfirmed,
            AuthorizationError::NotConfirmed { .. } => ErrorKind::NotConfirmed,
            AuthorizationError::InsufficientConfirmations { .. } => {
                ErrorKind::InsufficientConfirmations
            }
            AuthorizationError::ExecutionFailed { .. } => ErrorKind::ExecutionFailed,
        }
    }
}

/// Result type for authorization operations
pub type AuthorizationResult<T> = Result<T, AuthorizationError>;

/// Failures reported by a transfer effect
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Not enough value held to cover the transfer
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Value currently held
        available: Amount,
        /// Value requested
        requested: Amount,
    },

    /// The recipient refused the transfer
    #[error("Recipient {0} rejected the transfer")]
    RecipientRejected(Identity),

    /// Crediting the account would overflow its balance
    #[error("Balance overflow crediting {0}")]
    Overflow(Identity),
}
