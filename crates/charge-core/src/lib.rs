//! # charge-core
//!
//! Watches an asynchronous payment charge until the processor reports a final
//! outcome, then hands control back to the page that was waiting on it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    ChargeStatusPoller                         │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌──────────────┐  │
//! │  │  Poll Loop   │──▶│  StatusSource    │   │  Navigator   │  │
//! │  │ (interval)   │   │  (Strategy)      │   │  (one-shot)  │  │
//! │  └──────┬───────┘   └──────────────────┘   └──────▲───────┘  │
//! │         └──────── first non-pending status ───────┘          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `StatusSource` hides the transport; `charge-runtime` ships the HTTP
//! implementation that posts to the shop's charge status endpoint.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use charge_core::{ChargeReference, ChargeStatusPoller, PollerConfig};
//!
//! let poller = ChargeStatusPoller::start(
//!     ChargeReference::new("chrg_123")?,
//!     PollerConfig::from_millis(5000)?,
//!     source,
//!     navigator,
//! )?;
//!
//! let outcome = poller.wait().await;
//! ```

pub mod charge;
pub mod cookie;
pub mod error;
pub mod navigation;
pub mod poller;
pub mod source;
pub mod wire;

pub use charge::{ChargeReference, ChargeStatus};
pub use cookie::{CSRF_COOKIE_NAME, CookieStore, MemoryCookieStore};
pub use error::{PollError, Result};
pub use navigation::{Navigator, Resolution, ReturnUrls};
pub use poller::{ChargeStatusPoller, PollerConfig, PollerState};
pub use source::StatusSource;
pub use wire::{ChargeData, PollResult, StatusRequest};
