//! Status Source Strategy
//!
//! Abstracts how a charge's status is fetched so the poller works the same
//! against the HTTP endpoint and against scripted sources in tests.

use async_trait::async_trait;

use crate::charge::ChargeReference;
use crate::error::Result;
use crate::wire::PollResult;

/// Where the poller asks for a charge's status
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Issue one status request for `charge`
    async fn fetch_status(&self, charge: &ChargeReference) -> Result<PollResult>;

    /// Source name for logs
    fn name(&self) -> &str;
}
