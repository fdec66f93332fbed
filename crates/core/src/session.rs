// crates/core/src/session.rs
//! Credential/session providers for forum HTTP clients.
//!
//! Forums gate their listings behind a logged-in session. A provider hands
//! scrape jobs a `reqwest::Client` that already carries that session.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use std::time::Duration;

use crate::error::ScrapeError;

/// Default per-request timeout for forum clients.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; rv:115.0) Gecko/20100101 Firefox/115.0";

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Build a client that carries the forum session.
    async fn client(&self) -> Result<reqwest::Client, ScrapeError>;
}

/// Session backed by a fixed set of cookies captured from a logged-in browser.
#[derive(Debug, Clone)]
pub struct CookieSession {
    cookies: Vec<(String, String)>,
    timeout: Duration,
    user_agent: String,
}

impl CookieSession {
    pub fn new(cookies: Vec<(String, String)>) -> Self {
        Self {
            cookies,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Anonymous session (no cookies).
    pub fn anonymous() -> Self {
        Self::new(Vec::new())
    }

    /// Parse a `Cookie:`-style header value (`a=1; b=2`).
    pub fn from_header(header: &str) -> Self {
        Self::new(parse_cookie_header(header))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    /// The `Cookie` header this session sends, or `None` when anonymous.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[async_trait]
impl SessionProvider for CookieSession {
    async fn client(&self) -> Result<reqwest::Client, ScrapeError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| ScrapeError::Session(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, agent);
        if let Some(cookie) = self.cookie_header() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| ScrapeError::Session(format!("invalid cookie value: {e}")))?;
            headers.insert(COOKIE, value);
        }

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ScrapeError::Session(e.to_string()))
    }
}

/// Split `a=1; b=2` into pairs. Malformed fragments are skipped.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|part| {
            let (name, value) = part.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
