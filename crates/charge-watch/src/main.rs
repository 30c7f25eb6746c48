//! charge-watch
//!
//! Polls the shop's charge status endpoint until an asynchronous charge
//! (e.g. a PromptPay QR payment) settles, then reports the outcome.
//!
//! Exit codes: `0` successful, `1` any other settled status, `130` when
//! interrupted before the charge settled.

mod navigator;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use charge_core::{
    CSRF_COOKIE_NAME, ChargeReference, ChargeStatusPoller, MemoryCookieStore, PollerConfig,
    PollerState, ReturnUrls,
};
use charge_runtime::{HttpStatusConfig, HttpStatusSource};

use crate::navigator::ReportingNavigator;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let charge = std::env::var("CHARGE_REFERENCE").context("CHARGE_REFERENCE not set")?;
    let charge = ChargeReference::new(charge)?;

    let cookies = Arc::new(cookies_from_env());
    if cookies.is_empty() {
        tracing::warn!("⚠ No session cookies configured - requests carry no anti-forgery token");
        tracing::warn!("  Set CHARGE_COOKIES or CSRF_TOKEN in .env");
    }

    let config = PollerConfig::from_env()?;
    let http = http_config(HttpStatusConfig::from_env()?, &config);
    let source = HttpStatusSource::new(http, cookies)?;
    let navigator = Arc::new(ReportingNavigator::new(ReturnUrls::from_env()));

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Watching charge {}", charge);
    tracing::info!("  Endpoint: {}", source.endpoint());
    tracing::info!("  Interval: {:?}", config.interval);
    tracing::info!("══════════════════════════════════════════════════");

    let poller = ChargeStatusPoller::start(charge, config, Arc::new(source), navigator)?;

    let state = tokio::select! {
        state = poller.wait() => state,
        () = interrupted() => {
            tracing::warn!("Interrupted, stopping poller");
            poller.stop();
            poller.wait().await
        }
    };

    Ok(ExitCode::from(exit_status(&state)))
}

/// Transport timeout follows `CHARGE_REQUEST_TIMEOUT_MS` so reqwest never cuts
/// a request shorter than the poller allows
fn http_config(http: HttpStatusConfig, poller: &PollerConfig) -> HttpStatusConfig {
    http.with_timeout(poller.request_timeout)
}

async fn interrupted() {
    on_signal(tokio::signal::ctrl_c()).await;
}

/// Resolves when `signal` fires; never resolves if the listener failed
async fn on_signal(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Session cookies from `CHARGE_COOKIES`, with `CSRF_TOKEN` overriding the token
fn cookies_from_env() -> MemoryCookieStore {
    let store = std::env::var("CHARGE_COOKIES")
        .map(|header| MemoryCookieStore::from_header(&header))
        .unwrap_or_default();

    if let Ok(token) = std::env::var("CSRF_TOKEN") {
        let name = std::env::var("CSRF_COOKIE_NAME").unwrap_or_else(|_| CSRF_COOKIE_NAME.into());
        store.set(name, token);
    }

    store
}

const fn exit_status(state: &PollerState) -> u8 {
    match state {
        PollerState::Resolved(resolution) if resolution.status.is_successful() => 0,
        PollerState::Resolved(_) => 1,
        PollerState::Polling | PollerState::Cancelled => 130,
    }
}
