//! Session Cookie Store
//!
//! The anti-forgery token lives in the session cookie. Pollers read it on
//! every tick and never write it.

use std::collections::BTreeMap;
use std::sync::RwLock;

/// Cookie name carrying the anti-forgery token
pub const CSRF_COOKIE_NAME: &str = "csrftoken";

/// Read access to the session's cookies
pub trait CookieStore: Send + Sync {
    /// Get a cookie value by name
    fn get_cookie(&self, name: &str) -> Option<String>;

    /// Render all cookies as a `Cookie:` header value
    fn cookie_header(&self) -> Option<String> {
        None
    }
}

/// In-memory cookie store
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: RwLock<BTreeMap<String, String>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw `Cookie:` header (`a=1; csrftoken=abc`)
    ///
    /// Pairs without `=` are skipped. A name seen twice keeps its first value.
    pub fn from_header(header: &str) -> Self {
        let mut cookies = BTreeMap::new();
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies
                .entry(name.to_string())
                .or_insert_with(|| value.trim().to_string());
        }
        Self {
            cookies: RwLock::new(cookies),
        }
    }

    /// Set or replace a cookie
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut cookies = self
            .cookies
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cookies.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.cookies
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookieStore for MemoryCookieStore {
    fn get_cookie(&self, name: &str) -> Option<String> {
        let cookies = self
            .cookies
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        cookies.get(name).cloned()
    }

    fn cookie_header(&self) -> Option<String> {
        let cookies = self
            .cookies
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if cookies.is_empty() {
            return None;
        }
        let header = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }
}
