//! QuorumVault authorization engine
//!
//! A fixed set of owners jointly authorizes value transfers through an
//! explicit confirmation threshold.
//!
//! # Architecture
//!
//! Actions flow through the following pipeline:
//! 1. An owner submits an action to the `ActionLedger`
//! 2. Owners confirm (or revoke) through the `ConfirmationTracker`
//! 3. Once `OwnerRegistry::required_confirmations` is reached, any owner may
//!    execute through the `AuthorizationEngine`
//! 4. The engine marks the action executed, then runs the `TransferEffect`;
//!    a failed effect rolls the mark back
//! 5. Every transition is appended to the hash-chained `AuditJournal`
//!
//! # Examples
//!
//! ```no_run
//! use quorumvault_authorization::{AuthorizationEngine, InMemoryTreasury, OwnerRegistry};
//! use quorumvault_core::Identity;
//!
//! let alice = Identity::new("alice");
//! let bob = Identity::new("bob");
//! let registry = OwnerRegistry::new(vec![alice.clone(), bob.clone()], 2).unwrap();
//! let engine = AuthorizationEngine::new(registry, InMemoryTreasury::new());
//!
//! engine.effect().deposit(&alice, 100).unwrap();
//! let id = engine.submit(&alice, Identity::new("carl"), 100, Vec::new()).unwrap();
//! engine.confirm(id, &alice).unwrap();
//! engine.confirm(id, &bob).unwrap();
//! engine.execute(id, &bob).unwrap();
//! ```

pub mod confirmations;
pub mod effect;
pub mod engine;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod registry;
pub mod treasury;

pub use confirmations::{ConfirmationSet, ConfirmationTracker};
pub use effect::TransferEffect;
pub use engine::{AuthorizationEngine, EngineMetrics, WalletState};
pub use error::{AuthorizationError, AuthorizationResult, ErrorKind, TransferError};
pub use journal::{verify_entries, AuditJournal, AuthorizationEvent, JournalEntry, JournalError};
pub use ledger::{Action, ActionLedger, ActionStatus};
pub use registry::OwnerRegistry;
pub use treasury::{Deposit, InMemoryTreasury, TransferRecord};
