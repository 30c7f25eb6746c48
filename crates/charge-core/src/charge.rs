//! Charge Identity and Status
//!
//! A charge is a payment attempt tracked by the remote processor. The poller
//! only ever distinguishes `pending` from everything else, but the known
//! processor literals are kept as variants so callers can route on them.

use serde::{Deserialize, Serialize};

use crate::error::{PollError, Result};

/// Opaque charge identifier (e.g. `chrg_test_5rt6s9vah5lkvi1rh9c`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChargeReference(String);

impl ChargeReference {
    /// Create a reference, rejecting empty or blank identifiers
    pub fn new(reference: impl Into<String>) -> Result<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(PollError::InvalidCharge(
                "charge reference must not be empty".into(),
            ));
        }
        Ok(Self(reference))
    }

    /// Get the reference as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChargeReference {
    type Error = PollError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ChargeReference> for String {
    fn from(reference: ChargeReference) -> Self {
        reference.0
    }
}

impl std::fmt::Display for ChargeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Charge status as reported by the processor
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChargeStatus {
    Failed,
    Expired,
    Pending,
    Reversed,
    Successful,
    Unknown,
    /// Any literal the processor may add later
    Other(String),
}

impl ChargeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Failed => "failed",
            Self::Expired => "expired",
            Self::Pending => "pending",
            Self::Reversed => "reverse",
            Self::Successful => "successful",
            Self::Unknown => "unknown",
            Self::Other(literal) => literal,
        }
    }

    /// Parse from the exact wire literal (case-sensitive)
    pub fn from_literal(literal: &str) -> Self {
        match literal {
            "failed" => Self::Failed,
            "expired" => Self::Expired,
            "pending" => Self::Pending,
            "reverse" => Self::Reversed,
            "successful" => Self::Successful,
            "unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Only the exact literal `pending` keeps a poller waiting
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub const fn is_successful(&self) -> bool {
        matches!(self, Self::Successful)
    }
}

impl From<String> for ChargeStatus {
    fn from(value: String) -> Self {
        Self::from_literal(&value)
    }
}

impl From<ChargeStatus> for String {
    fn from(status: ChargeStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
