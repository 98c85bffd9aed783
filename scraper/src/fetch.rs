//! Detail page fetching with a fixed politeness delay and bounded retries.

use std::thread;
use std::time::Duration;

use common::FetchedPage;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::error::FetchError;

/// Longest text kept from a detail page.
pub const MAX_PAGE_CHARS: usize = 5_000;

/// Content containers in priority order; the first one with text wins.
pub const CONTENT_SELECTORS: &[&str] = &[
    "[data-testid='text-section']",
    "#job-description",
    ".job-description",
    "[class*='job-description']",
    "[class*='description']",
    ".jobsearch-JobComponent-description",
    ".show-more-less-html__markup",
    "article",
    "main",
    "[role='main']",
    "#content",
    ".content",
];

/// How hard to try before giving up on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    /// Slept once before the first attempt at every page.
    pub politeness_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(2),
            politeness_delay: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: the n-th failure waits `n * base_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * attempt
    }
}

pub trait Transport {
    fn get(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text()?)
    }
}

pub struct DetailFetcher {
    transport: Box<dyn Transport>,
    policy: RetryPolicy,
}

impl DetailFetcher {
    pub fn new(transport: Box<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Always returns a page; after the last failed attempt that page is
    /// the [`FetchedPage::unavailable`] sentinel.
    pub fn fetch(&self, url: &str) -> FetchedPage {
        thread::sleep(self.policy.politeness_delay);

        for attempt in 1..=self.policy.max_attempts {
            match self.transport.get(url) {
                Ok(html) => {
                    let text = extract_content(&html);
                    debug!(url, attempt, chars = text.chars().count(), "page fetched");
                    return FetchedPage {
                        url: url.to_string(),
                        text,
                        fetched: true,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "⚠️ Fetch attempt failed");
                    if attempt < self.policy.max_attempts {
                        thread::sleep(self.policy.backoff(attempt));
                    }
                }
            }
        }

        warn!(url, attempts = self.policy.max_attempts, "❌ Giving up on page");
        FetchedPage::unavailable(url, self.policy.max_attempts)
    }
}

/// Text of an element without script and style bodies, whitespace collapsed.
fn visible_text(element: ElementRef) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent()?;
            let hidden = parent
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript"));
            (!hidden).then_some(&**text)
        })
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

/// The largest block under the highest-priority selector that has text,
/// falling back to the whole body.
pub fn extract_content(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        let largest = document
            .select(&selector)
            .map(visible_text)
            .max_by_key(|text| text.len());
        if let Some(text) = largest.filter(|t| !t.is_empty()) {
            return truncate_chars(text, MAX_PAGE_CHARS);
        }
    }

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());
    truncate_chars(visible_text(body), MAX_PAGE_CHARS)
}
