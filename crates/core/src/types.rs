//! Core types shared across QuorumVault crates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential identifier assigned to a submitted action, starting at 0.
pub type ActionId = u64;

/// Quantity of value moved by an action.
pub type Amount = u128;

/// An already-authenticated principal (owner, transfer target, depositor).
///
/// The authentication layer sits outside this system; an `Identity` is
/// trusted as-is wherever it appears.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create an identity from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
