//! Page Navigation
//!
//! Resolving a charge ends with exactly one reload of the page that was
//! waiting on it. Where that page lands afterwards depends on the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::charge::{ChargeReference, ChargeStatus};

/// Outcome of a poller that saw a non-pending status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub charge: ChargeReference,

    /// First non-pending status observed
    pub status: ChargeStatus,

    /// 1-based tick on which the status was observed
    pub tick: u64,

    pub resolved_at: DateTime<Utc>,
}

/// Navigation primitive invoked once a charge resolves
pub trait Navigator: Send + Sync {
    /// Reload the page waiting on the charge. Called at most once per poller.
    fn reload_current_page(&self, resolution: &Resolution);
}

/// Landing pages for a resolved charge
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnUrls {
    #[serde(default)]
    pub successful_url: Option<String>,

    #[serde(default)]
    pub failed_url: Option<String>,

    #[serde(default = "default_redirect_url")]
    pub default_url: String,
}

fn default_redirect_url() -> String {
    "/".into()
}

impl Default for ReturnUrls {
    fn default() -> Self {
        Self {
            successful_url: None,
            failed_url: None,
            default_url: default_redirect_url(),
        }
    }
}

impl ReturnUrls {
    /// Load from `CHARGE_SUCCESSFUL_URL` / `CHARGE_FAILED_URL`
    pub fn from_env() -> Self {
        Self {
            successful_url: std::env::var("CHARGE_SUCCESSFUL_URL").ok(),
            failed_url: std::env::var("CHARGE_FAILED_URL").ok(),
            ..Default::default()
        }
    }

    /// Pick the landing page for `status`
    ///
    /// Only `successful` and `failed` have dedicated pages; every other
    /// status, and an unset page, falls back to the default.
    pub fn redirect_for(&self, status: &ChargeStatus) -> &str {
        let target = match status {
            ChargeStatus::Successful => self.successful_url.as_deref(),
            ChargeStatus::Failed => self.failed_url.as_deref(),
            _ => None,
        };
        target.unwrap_or(&self.default_url)
    }
}
