//! Charge Status Poller
//!
//! Watches one charge until it leaves `pending`, then reloads the waiting
//! page exactly once.
//!
//! ```text
//!              stop()
//!   Polling ───────────▶ Cancelled
//!      │
//!      │ first non-pending status
//!      ▼
//!   Resolved ──▶ Navigator::reload_current_page (once)
//! ```
//!
//! Each tick sleeps one interval, issues a single request and awaits it (or
//! its timeout) before the next sleep starts, so requests never overlap and
//! responses cannot arrive out of order.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::charge::{ChargeReference, ChargeStatus};
use crate::error::{PollError, Result};
use crate::navigation::{Navigator, Resolution};
use crate::source::StatusSource;
use crate::wire::PollResult;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Poller configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay before the first request and between settled requests
    pub interval: Duration,

    /// Upper bound on a single status request
    pub request_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl PollerConfig {
    /// Create with a poll interval in milliseconds
    pub fn from_millis(interval_ms: u64) -> Result<Self> {
        let config = Self {
            interval: Duration::from_millis(interval_ms),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load from `CHARGE_POLL_INTERVAL_MS` and `CHARGE_REQUEST_TIMEOUT_MS`
    pub fn from_env() -> Result<Self> {
        let interval = std::env::var("CHARGE_POLL_INTERVAL_MS").ok();
        let timeout = std::env::var("CHARGE_REQUEST_TIMEOUT_MS").ok();
        Self::parse(interval.as_deref(), timeout.as_deref())
    }

    /// Build from optional millisecond strings, defaulting what is absent
    pub fn parse(interval_ms: Option<&str>, timeout_ms: Option<&str>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = interval_ms {
            config.interval = parse_millis("CHARGE_POLL_INTERVAL_MS", raw)?;
        }
        if let Some(raw) = timeout_ms {
            config.request_timeout = parse_millis("CHARGE_REQUEST_TIMEOUT_MS", raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(PollError::Config("poll interval must be positive".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(PollError::Config("request timeout must be positive".into()));
        }
        Ok(())
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| PollError::Config(format!("{key}={raw:?}: {e}")))
}

/// Lifecycle of one poller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollerState {
    Polling,
    Resolved(Resolution),
    Cancelled,
}

impl PollerState {
    pub const fn is_polling(&self) -> bool {
        matches!(self, Self::Polling)
    }

    pub const fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::Resolved(resolution) => Some(resolution),
            _ => None,
        }
    }
}

/// Handle to a running poller
///
/// Dropping the handle stops the poller.
pub struct ChargeStatusPoller {
    charge: ChargeReference,
    state: Arc<watch::Sender<PollerState>>,
    task: JoinHandle<()>,
}

impl ChargeStatusPoller {
    /// Spawn a poller on the current tokio runtime
    ///
    /// The first request is issued one interval after this call.
    pub fn start(
        charge: ChargeReference,
        config: PollerConfig,
        source: Arc<dyn StatusSource>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        config.validate()?;

        let (state, _) = watch::channel(PollerState::Polling);
        let state = Arc::new(state);

        tracing::info!(
            charge = %charge,
            source = source.name(),
            interval = ?config.interval,
            "Starting charge status poller"
        );

        let task = tokio::spawn(
            PollLoop {
                charge: charge.clone(),
                config,
                source,
                navigator,
                state: state.clone(),
            }
            .run(),
        );

        Ok(Self {
            charge,
            state,
            task,
        })
    }

    pub const fn charge(&self) -> &ChargeReference {
        &self.charge
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PollerState {
        self.state.borrow().clone()
    }

    /// Stop issuing requests
    ///
    /// Idempotent, and a no-op once the charge has resolved. A request already
    /// in flight is left to finish and its result is discarded.
    pub fn stop(&self) {
        if cancel(&self.state) {
            tracing::info!(charge = %self.charge, "Charge status poller stopped");
        }
    }

    /// Wait until the poller resolves or is stopped
    ///
    /// A polling task that dies (e.g. a panicking source) leaves the poller
    /// `Cancelled`, so this never waits on a dead task.
    pub async fn wait(&self) -> PollerState {
        let mut state = self.state.subscribe();
        let terminal = match state.wait_for(|state| !state.is_polling()).await {
            Ok(terminal) => terminal.clone(),
            Err(_) => return self.state(),
        };
        terminal
    }

    /// Whether the polling task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ChargeStatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PollLoop {
    charge: ChargeReference,
    config: PollerConfig,
    source: Arc<dyn StatusSource>,
    navigator: Arc<dyn Navigator>,
    state: Arc<watch::Sender<PollerState>>,
}

impl PollLoop {
    async fn run(self) {
        let _exit = CancelOnExit {
            charge: &self.charge,
            state: &self.state,
        };
        let mut state = self.state.subscribe();
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                biased;
                () = stopped(&mut state) => break,
                () = tokio::time::sleep(self.config.interval) => {}
            }

            tick += 1;
            tracing::trace!(charge = %self.charge, tick, "Polling charge status");
            let outcome = self.poll_once().await;

            // Stopped while the request was in flight: discard quietly.
            let polling = self.state.borrow().is_polling();
            if !polling {
                break;
            }

            match outcome {
                Ok(status) if status.is_pending() => {
                    tracing::debug!(charge = %self.charge, tick, "Charge still pending");
                }
                Ok(status) => {
                    self.resolve(status, tick);
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        charge = %self.charge,
                        tick,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Charge status poll failed, retrying next tick"
                    );
                }
            }
        }

        tracing::debug!(charge = %self.charge, tick, "Charge status poller exited");
    }

    async fn poll_once(&self) -> Result<ChargeStatus> {
        let request = self.source.fetch_status(&self.charge);
        match tokio::time::timeout(self.config.request_timeout, request).await {
            Ok(result) => result.and_then(PollResult::into_status),
            Err(_) => Err(PollError::Timeout(self.config.request_timeout)),
        }
    }

    /// Move to `Resolved` and reload, unless the poller already left `Polling`
    fn resolve(&self, status: ChargeStatus, tick: u64) {
        let resolution = Resolution {
            charge: self.charge.clone(),
            status,
            tick,
            resolved_at: Utc::now(),
        };

        let won = self.state.send_if_modified(|state| {
            if state.is_polling() {
                *state = PollerState::Resolved(resolution.clone());
                true
            } else {
                false
            }
        });

        if won {
            tracing::info!(
                charge = %self.charge,
                status = %resolution.status,
                tick,
                "Charge resolved, reloading page"
            );
            self.navigator.reload_current_page(&resolution);
        }
    }
}

/// Leaves `Polling` however the loop exits, unwinding included
struct CancelOnExit<'a> {
    charge: &'a ChargeReference,
    state: &'a watch::Sender<PollerState>,
}

impl Drop for CancelOnExit<'_> {
    fn drop(&mut self) {
        if cancel(self.state) {
            tracing::warn!(charge = %self.charge, "Charge status poller exited while polling");
        }
    }
}

/// `Polling -> Cancelled`; false if the poller already left `Polling`
fn cancel(state: &watch::Sender<PollerState>) -> bool {
    state.send_if_modified(|state| {
        if state.is_polling() {
            *state = PollerState::Cancelled;
            true
        } else {
            false
        }
    })
}

async fn stopped(state: &mut watch::Receiver<PollerState>) {
    let _ = state.wait_for(|state| !state.is_polling()).await;
}
