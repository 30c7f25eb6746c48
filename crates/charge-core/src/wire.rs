//! Status Endpoint Wire Types
//!
//! ```text
//! POST <endpoint>               { "charge": "chrg_123" }
//! 200 OK                        { "data": { "status": "pending" } }
//! ```

use serde::{Deserialize, Serialize};

use crate::charge::{ChargeReference, ChargeStatus};
use crate::error::{PollError, Result};

/// Body of one status request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub charge: ChargeReference,
}

impl StatusRequest {
    pub fn new(charge: &ChargeReference) -> Self {
        Self {
            charge: charge.clone(),
        }
    }
}

/// Decoded body of one status response
///
/// Both levels are optional so that a body missing the status can still be
/// decoded and classified as malformed instead of failing deserialization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    #[serde(default)]
    pub data: Option<ChargeData>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeData {
    #[serde(default)]
    pub status: Option<ChargeStatus>,
}

impl PollResult {
    /// Build a well-formed result carrying `status`
    pub fn with_status(status: ChargeStatus) -> Self {
        Self {
            data: Some(ChargeData {
                status: Some(status),
            }),
        }
    }

    /// Decode a raw response body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| PollError::MalformedResponse(e.to_string()))
    }

    /// Extract `data.status`
    pub fn into_status(self) -> Result<ChargeStatus> {
        let data = self
            .data
            .ok_or_else(|| PollError::MalformedResponse("response has no `data` object".into()))?;
        data.status
            .ok_or_else(|| PollError::MalformedResponse("response has no `data.status`".into()))
    }
}
