//! Core functionality for the QuorumVault multi-party authorization system.
//!
//! This crate provides the shared identity types, configuration loading and
//! logging setup used across the QuorumVault workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{Config, LogFormat, LoggingConfig, WalletConfig};
pub use error::{CoreError, Result};
pub use types::{ActionId, Amount, Identity};
