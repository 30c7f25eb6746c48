//! HTTP Status Source
//!
//! Implementation of `StatusSource` against the shop's charge status
//! endpoint. Every request carries the session cookies and the anti-forgery
//! token read from them, as a same-origin browser request would.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use charge_core::{
    ChargeReference, PollResult, StatusRequest, StatusSource,
    cookie::{CSRF_COOKIE_NAME, CookieStore},
    error::{PollError, Result},
    poller::DEFAULT_REQUEST_TIMEOUT,
};
use reqwest::{Client, Url, header};

/// Header the status endpoint reads the anti-forgery token from
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";

/// HTTP source configuration
#[derive(Clone, Debug)]
pub struct HttpStatusConfig {
    /// Absolute status endpoint URL
    pub endpoint: Url,

    /// Cookie holding the anti-forgery token
    pub csrf_cookie_name: String,

    /// Header the token is echoed in
    pub csrf_header_name: String,

    /// Transport-level timeout; keep it at least the poller's request timeout
    pub timeout: Duration,
}

impl HttpStatusConfig {
    /// Create for `endpoint` with default cookie/header names
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            csrf_cookie_name: CSRF_COOKIE_NAME.into(),
            csrf_header_name: CSRF_HEADER_NAME.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Load from `CHARGE_STATUS_URL` (required) and `CSRF_COOKIE_NAME`
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("CHARGE_STATUS_URL")
            .map_err(|_| PollError::Config("CHARGE_STATUS_URL not set".into()))?;

        let mut config = Self::new(&endpoint)?;
        if let Ok(name) = std::env::var("CSRF_COOKIE_NAME") {
            config.csrf_cookie_name = name;
        }
        Ok(config)
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PollError::Config(format!("invalid status endpoint {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(PollError::Config(format!(
            "status endpoint must be http(s), got {scheme:?}"
        ))),
    }
}

/// Status source backed by the charge status endpoint
pub struct HttpStatusSource {
    client: Client,
    config: HttpStatusConfig,
    cookies: Arc<dyn CookieStore>,
}

impl HttpStatusSource {
    pub fn new(config: HttpStatusConfig, cookies: Arc<dyn CookieStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PollError::Config(e.to_string()))?;

        Ok(Self {
            client,
            config,
            cookies,
        })
    }

    pub const fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    fn transport_error(&self, err: &reqwest::Error) -> PollError {
        if err.is_timeout() {
            PollError::Timeout(self.config.timeout)
        } else {
            PollError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self, charge: &ChargeReference) -> Result<PollResult> {
        let mut request = self
            .client
            .post(self.config.endpoint.clone())
            .json(&StatusRequest::new(charge));

        // Read on every request: the session may rotate the token.
        match self.cookies.get_cookie(&self.config.csrf_cookie_name) {
            Some(token) => {
                request = request.header(self.config.csrf_header_name.as_str(), token);
            }
            None => {
                tracing::warn!(
                    cookie = %self.config.csrf_cookie_name,
                    "Anti-forgery cookie missing, sending status request without token"
                );
            }
        }
        if let Some(cookies) = self.cookies.cookie_header() {
            request = request.header(header::COOKIE, cookies);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        PollResult::from_slice(&body)
    }

    fn name(&self) -> &str {
        "http"
    }
}
