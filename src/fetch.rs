//! Single-page comment fetching and text cleaning.
//!
//! Every fetch goes out with a freshly rotated user agent and an optional
//! proxy, then waits out a randomized politeness delay before returning,
//! success or failure. Uniform request timing is what trips anti-scraping
//! defenses, so the jitter stays.

use std::time::Duration;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use scraper::{Html, Selector};
use tokio::time::sleep;
use tracing::debug;

use crate::dispatch::RequestDispatcher;
use crate::error::Result;

/// Comments per listing page; the site paginates by offset.
pub const PAGE_SIZE: u32 = 20;

/// Cast entries taken from the top of the celebrities page.
pub const CAST_LIMIT: usize = 8;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+\s?").expect("valid regex"));
static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"【[^】]*】").expect("valid regex"));
static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\x{4e00}-\x{9fff}]").expect("valid regex"));

static COMMENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.short").expect("valid selector"));
static CAST_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li.celebrity").expect("valid selector"));
static NAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.name").expect("valid selector"));

/// Strip markup and noise from a raw comment. Pure and idempotent:
/// cleaning already-cleaned text is a no-op.
pub fn clean_text(text: &str) -> String {
    let text = TAG_RE.replace_all(text, "");
    let text = MENTION_RE.replace_all(&text, "");
    let text = BRACKET_RE.replace_all(&text, "");
    // Anything that is neither a word char nor a CJK ideograph becomes a space.
    let text = NON_WORD_RE.replace_all(&text, " ");
    text.trim().to_owned()
}

/// Fetches one resource at a time with dispatcher-built identity.
pub struct CommentFetcher {
    dispatcher: RequestDispatcher,
    base_url: String,
    timeout: Duration,
    page_delay_ms: (u64, u64),
}

impl CommentFetcher {
    pub fn new(
        dispatcher: RequestDispatcher,
        base_url: impl Into<String>,
        timeout_secs: u64,
        page_delay_ms: (u64, u64),
    ) -> Self {
        Self {
            dispatcher,
            base_url: base_url.into(),
            timeout: Duration::from_secs(timeout_secs),
            page_delay_ms,
        }
    }

    /// One page of short reviews, cleaned. The politeness delay runs after
    /// the fetch whether it succeeded or not.
    pub async fn fetch_page(&self, film_id: &str, page: u32) -> Result<Vec<String>> {
        let url = format!(
            "{}/subject/{}/comments?start={}",
            self.base_url,
            film_id,
            page * PAGE_SIZE
        );
        let result = self.get(&url).await.map(|body| extract_comments(&body));
        self.politeness_delay().await;
        result
    }

    /// Cast names from the celebrities page, top `CAST_LIMIT` entries.
    pub async fn fetch_cast(&self, film_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/subject/{}/celebrities", self.base_url, film_id);
        self.get(&url).await.map(|body| extract_cast(&body))
    }

    async fn get(&self, url: &str) -> Result<String> {
        let headers = self.dispatcher.headers();
        let client = self.build_client()?;
        debug!(url, agent = headers.user_agent, "GET");
        let response = client
            .get(url)
            .header(reqwest::header::USER_AGENT, headers.user_agent)
            .header(reqwest::header::REFERER, headers.referer.as_str())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    // Built per request so the proxy rotates with the user agent.
    fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if let Some(proxy) = self.dispatcher.proxy() {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(builder.build()?)
    }

    async fn politeness_delay(&self) {
        let (min, max) = self.page_delay_ms;
        let ms = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        sleep(Duration::from_millis(ms)).await;
    }
}

fn extract_comments(body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    document
        .select(&COMMENT_SELECTOR)
        .map(|node| clean_text(&node.text().collect::<String>()))
        .filter(|comment| !comment.is_empty())
        .collect()
}

fn extract_cast(body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    document
        .select(&CAST_SELECTOR)
        .take(CAST_LIMIT)
        .filter_map(|entry| {
            entry
                .select(&NAME_SELECTOR)
                .next()
                .map(|name| name.text().collect::<String>().trim().to_owned())
        })
        .filter(|name| !name.is_empty())
        .collect()
}
