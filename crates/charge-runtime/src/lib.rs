//! # charge-runtime
//!
//! Runtime status sources for the charge status poller.
//!
//! ## Sources
//!
//! - **HTTP** (default): posts `{ "charge": ... }` to the shop's status
//!   endpoint with the session's anti-forgery token
//!
//! ## Usage
//!
//! ```rust,ignore
//! use charge_runtime::{HttpStatusConfig, HttpStatusSource};
//!
//! let cookies = Arc::new(MemoryCookieStore::from_header("csrftoken=abc"));
//! let source = HttpStatusSource::new(HttpStatusConfig::new("https://shop.example/charge/status/")?, cookies)?;
//! let poller = ChargeStatusPoller::start(charge, PollerConfig::default(), Arc::new(source), navigator)?;
//! ```

pub mod http;

pub use http::{HttpStatusConfig, HttpStatusSource};

// Re-export core types for convenience
pub use charge_core::{
    ChargeReference, ChargeStatus, ChargeStatusPoller, CookieStore, MemoryCookieStore, Navigator,
    PollError, PollResult, PollerConfig, PollerState, Resolution, Result, ReturnUrls,
    StatusSource,
};
