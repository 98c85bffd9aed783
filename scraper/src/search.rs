//! Search-results API client (SerpAPI `search.json`).

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::terms::fold;
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

/// One organic result: link, title, snippet and the engine's date hint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<SearchHit>,
}

pub trait SearchBackend {
    /// Never fails: errors are logged and reported as no results.
    fn search(&self, query: &str) -> Vec<SearchHit>;
}

pub struct SerpApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_results: usize,
}

impl SerpApiClient {
    pub fn new(client: Client, base_url: &str, api_key: String, max_results: usize) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_results,
        }
    }

    fn try_search(&self, query: &str) -> Result<Vec<SearchHit>, FetchError> {
        let url = format!("{}/search.json", self.base_url);
        let num = self.max_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("hl", "pt-BR"),
                ("gl", "br"),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body = response.text()?;
        Ok(parse_results(&body, self.max_results)?)
    }
}

impl SearchBackend for SerpApiClient {
    fn search(&self, query: &str) -> Vec<SearchHit> {
        match self.try_search(query) {
            Ok(hits) => {
                debug!(query, hits = hits.len(), "search returned");
                hits
            }
            Err(e) => {
                warn!(query, error = %e, "❌ Search failed, treating as zero results");
                vec![]
            }
        }
    }
}

/// Organic results from a `search.json` body, at most `max` of them.
pub fn parse_results(body: &str, max: usize) -> Result<Vec<SearchHit>, serde_json::Error> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .organic_results
        .into_iter()
        .filter(|hit| hit.link.starts_with("http"))
        .take(max)
        .collect())
}

static RELATIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+)\s*(minutos?|minutes?|mins?|horas?|hours?|hrs?|dias?|days?|semanas?|weeks?|meses|mes|months?)\b",
    )
    .expect("relative date pattern compiles")
});

/// Best guess at when a result was published, from strings such as
/// `3 days ago`, `há 2 semanas`, `ontem` or `Oct 10, 2026`.
pub fn estimate_published(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    for format in ["%b %d, %Y", "%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    let folded = fold(raw);
    if folded.contains("ontem") || folded.contains("yesterday") {
        return Some(now - Duration::days(1));
    }
    if folded.contains("hoje") || folded.contains("today") || folded.contains("just now") {
        return Some(now);
    }

    let caps = RELATIVE_DATE.captures(&folded)?;
    let amount: i64 = caps[1].parse().ok()?;
    let unit = &caps[2];
    let elapsed = if unit.starts_with("min") {
        Duration::try_minutes(amount)
    } else if unit.starts_with('h') {
        Duration::try_hours(amount)
    } else if unit.starts_with('d') {
        Duration::try_days(amount)
    } else if unit.starts_with("sem") || unit.starts_with("week") {
        Duration::try_weeks(amount)
    } else {
        amount.checked_mul(30).and_then(Duration::try_days)
    }?;
    now.checked_sub_signed(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_results_bounded() {
        let body = r#"{
            "search_metadata": {"status": "Success"},
            "organic_results": [
                {"link": "https://a.gupy.io/jobs/1", "title": "Dev Backend", "snippet": "São Paulo"},
                {"link": "https://b.gupy.io/jobs/2", "title": "Dev Frontend", "date": "2 days ago"},
                {"link": "https://c.gupy.io/jobs/3", "title": "QA"}
            ]
        }"#;
        let hits = parse_results(body, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].snippet, "São Paulo");
        assert_eq!(hits[1].date.as_deref(), Some("2 days ago"));
    }

    #[test]
    fn test_parse_results_without_organic_results() {
        assert!(parse_results(r#"{"error": "quota"}"#, 10).unwrap().is_empty());
    }

    #[test]
    fn test_parse_results_malformed() {
        assert!(parse_results("<html>oops</html>", 10).is_err());
    }

    #[test]
    fn test_parse_results_skips_non_http_links() {
        let body = r#"{"organic_results": [{"link": "javascript:void(0)"}, {"link": "http://x.com.br/1"}]}"#;
        assert_eq!(parse_results(body, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_estimate_published_relative() {
        assert_eq!(estimate_published("3 days ago", now()), Some(now() - Duration::days(3)));
        assert_eq!(estimate_published("há 2 semanas", now()), Some(now() - Duration::weeks(2)));
        assert_eq!(estimate_published("5 hours ago", now()), Some(now() - Duration::hours(5)));
        assert_eq!(estimate_published("Ontem", now()), Some(now() - Duration::days(1)));
        assert_eq!(estimate_published("há 1 mês", now()), Some(now() - Duration::days(30)));
    }

    #[test]
    fn test_estimate_published_absolute() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 10, 0, 0, 0).unwrap();
        assert_eq!(estimate_published("Oct 10, 2026", now()), Some(expected));
        assert_eq!(estimate_published("10/10/2026", now()), Some(expected));
    }

    #[test]
    fn test_estimate_published_unknown() {
        assert_eq!(estimate_published("Recente", now()), None);
        assert_eq!(estimate_published("", now()), None);
    }

    #[test]
    fn test_estimate_published_out_of_range_is_none() {
        assert_eq!(estimate_published("999999999 days ago", now()), None);
        assert_eq!(estimate_published("há 999999999999 meses", now()), None);
        assert_eq!(estimate_published("99999999999999999999 hours ago", now()), None);
    }
}
