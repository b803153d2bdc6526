//! Per-request identity: rotating user agent and optional proxy.
//!
//! The dispatcher never fails. An empty or misconfigured pool falls back to a
//! fixed default rather than propagating an error.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/123.0.0.0 Safari/537.36",
    ]
});

const FALLBACK_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Headers attached to every outbound request.
#[derive(Debug, Clone)]
pub struct RequestHeaders {
    pub user_agent: &'static str,
    pub referer: String,
}

/// Builds request identity for outbound fetches.
#[derive(Debug, Clone)]
pub struct RequestDispatcher {
    referer: String,
    proxy_pool: Vec<String>,
}

impl RequestDispatcher {
    pub fn new(referer: impl Into<String>, proxy_pool: Vec<String>) -> Self {
        Self {
            referer: referer.into(),
            proxy_pool,
        }
    }

    /// A freshly randomized user agent plus the fixed referer.
    pub fn headers(&self) -> RequestHeaders {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(FALLBACK_AGENT);
        RequestHeaders {
            user_agent,
            referer: self.referer.clone(),
        }
    }

    /// One proxy URL picked uniformly at random, or `None` for a direct
    /// connection when the pool is empty.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy_pool
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }
}
