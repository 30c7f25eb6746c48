//! Terminal Navigator
//!
//! Outside a browser there is no page to reload, so resolving a charge is
//! reported instead: a log line plus one JSON summary on stdout.

use chrono::{DateTime, Utc};
use serde::Serialize;

use charge_core::{Navigator, Resolution, ReturnUrls};

/// One-line summary printed when the charge resolves
#[derive(Debug, Serialize)]
pub struct ResolutionReport<'a> {
    pub charge: &'a str,
    pub status: &'a str,
    pub successful: bool,
    pub tick: u64,
    pub resolved_at: DateTime<Utc>,
    pub redirect: &'a str,
}

impl<'a> ResolutionReport<'a> {
    pub fn new(resolution: &'a Resolution, urls: &'a ReturnUrls) -> Self {
        Self {
            charge: resolution.charge.as_str(),
            status: resolution.status.as_str(),
            successful: resolution.status.is_successful(),
            tick: resolution.tick,
            resolved_at: resolution.resolved_at,
            redirect: urls.redirect_for(&resolution.status),
        }
    }
}

/// Navigator that reports the landing page instead of loading it
pub struct ReportingNavigator {
    urls: ReturnUrls,
}

impl ReportingNavigator {
    pub const fn new(urls: ReturnUrls) -> Self {
        Self { urls }
    }
}

impl Navigator for ReportingNavigator {
    fn reload_current_page(&self, resolution: &Resolution) {
        let report = ResolutionReport::new(resolution, &self.urls);

        tracing::info!(
            charge = report.charge,
            status = report.status,
            redirect = report.redirect,
            "Charge settled"
        );

        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!("Failed to encode resolution report: {}", e),
        }
    }
}
