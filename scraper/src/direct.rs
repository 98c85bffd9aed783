//! Feeds that list postings directly instead of going through search.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use common::RawPosting;
use reqwest::Url;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::fetch::Transport;

pub trait PostingFeed {
    fn name(&self) -> &str;

    /// Never fails: errors are logged and reported as an empty feed.
    fn postings(&self) -> Vec<RawPosting>;
}

pub const TRABALHA_BRASIL_URL: &str = "https://api.trabalhabrasil.com.br/v1/Job/List";
const TRABALHA_BRASIL_SOURCE: &str = "Trabalha Brasil";

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<ListItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListItem {
    #[serde(default)]
    titulo_vaga: String,
    #[serde(default)]
    municipio: Option<String>,
    #[serde(default)]
    uf: Option<String>,
    #[serde(default)]
    id_vaga: Option<Value>,
    #[serde(default)]
    data_publicacao: Option<String>,
}

/// Public listing API of the Brazilian government's job board.
pub struct TrabalhaBrasilFeed {
    client: Client,
    page_size: usize,
}

impl TrabalhaBrasilFeed {
    pub fn new(client: Client, page_size: usize) -> Self {
        Self { client, page_size }
    }

    fn try_fetch(&self) -> Result<Vec<RawPosting>, FetchError> {
        let response = self
            .client
            .post(TRABALHA_BRASIL_URL)
            .json(&json!({
                "filters": {"uf": "", "job": "", "page": 1, "pageSize": self.page_size}
            }))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: TRABALHA_BRASIL_URL.to_string(),
            });
        }
        Ok(parse_listing(&response.text()?)?)
    }
}

impl PostingFeed for TrabalhaBrasilFeed {
    fn name(&self) -> &str {
        TRABALHA_BRASIL_SOURCE
    }

    fn postings(&self) -> Vec<RawPosting> {
        match self.try_fetch() {
            Ok(postings) => {
                info!("📡 {} listed {} postings", TRABALHA_BRASIL_SOURCE, postings.len());
                postings
            }
            Err(e) => {
                warn!(error = %e, "❌ {} feed failed", TRABALHA_BRASIL_SOURCE);
                vec![]
            }
        }
    }
}

fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Raw postings from a `Job/List` body; items without title or id are skipped.
pub fn parse_listing(body: &str) -> Result<Vec<RawPosting>, serde_json::Error> {
    let response: ListResponse = serde_json::from_str(body)?;
    Ok(response
        .data
        .into_iter()
        .filter_map(|item| {
            let title = item.titulo_vaga.trim().to_string();
            let id = match item.id_vaga? {
                Value::String(s) => s,
                Value::Null => return None,
                other => other.to_string(),
            };
            if title.is_empty() || id.is_empty() {
                return None;
            }
            let place = match (non_empty(item.municipio), non_empty(item.uf)) {
                (Some(city), Some(uf)) => Some(format!("{city} - {uf}")),
                (city, uf) => city.or(uf),
            };
            Some(RawPosting {
                snippet: match &place {
                    Some(place) => format!("{title} - {place}"),
                    None => title.clone(),
                },
                title,
                url: format!("https://www.trabalhabrasil.com.br/vagas/{id}"),
                published_at: item.data_publicacao.as_deref().and_then(parse_published),
                geo_hint: place,
                source: TRABALHA_BRASIL_SOURCE.to_string(),
            })
        })
        .collect())
}

pub const INDEED_BASE_URL: &str = "https://br.indeed.com";
const INDEED_SOURCE: &str = "Indeed";
/// Results on one Indeed listing page; `start` advances by this.
const INDEED_PAGE_STEP: usize = 10;
pub const INDEED_MAX_POSTINGS: usize = 50;

/// Public search listing of Indeed Brasil, scraped page by page.
pub struct IndeedFeed {
    transport: Box<dyn Transport>,
    base_url: String,
    query: String,
    location: String,
    pages: usize,
    page_delay: Duration,
}

impl IndeedFeed {
    pub fn new(
        transport: Box<dyn Transport>,
        base_url: &str,
        query: &str,
        location: &str,
        pages: usize,
        page_delay: Duration,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            query: query.to_string(),
            location: location.to_string(),
            pages,
            page_delay,
        }
    }

    pub fn page_url(&self, page: usize) -> Option<Url> {
        let start = (page * INDEED_PAGE_STEP).to_string();
        Url::parse_with_params(
            &format!("{}/jobs", self.base_url),
            &[("q", self.query.as_str()), ("l", self.location.as_str()), ("start", start.as_str())],
        )
        .ok()
    }
}

impl PostingFeed for IndeedFeed {
    fn name(&self) -> &str {
        INDEED_SOURCE
    }

    fn postings(&self) -> Vec<RawPosting> {
        let mut postings: Vec<RawPosting> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for page in 0..self.pages {
            if page > 0 {
                thread::sleep(self.page_delay);
            }
            let Some(url) = self.page_url(page) else {
                warn!("❌ {} base URL is invalid: {}", INDEED_SOURCE, self.base_url);
                break;
            };
            let html = match self.transport.get(url.as_str()) {
                Ok(html) => html,
                Err(e) => {
                    warn!(error = %e, "❌ {} page {} failed", INDEED_SOURCE, page + 1);
                    continue;
                }
            };
            let found = parse_indeed_page(&html, &self.base_url);
            debug!(page = page + 1, found = found.len(), "indeed page parsed");
            postings.extend(found.into_iter().filter(|p| seen.insert(p.url.clone())));
            if postings.len() >= INDEED_MAX_POSTINGS {
                break;
            }
        }

        postings.truncate(INDEED_MAX_POSTINGS);
        info!("📡 {} listed {} postings", INDEED_SOURCE, postings.len());
        postings
    }
}

fn first_text(element: &ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

/// Raw postings from one Indeed listing page. Cards without a link are skipped.
pub fn parse_indeed_page(html: &str, base_url: &str) -> Vec<RawPosting> {
    let (Ok(card), Ok(link), Ok(company), Ok(place)) = (
        Selector::parse("div.job_seen_beacon"),
        Selector::parse("h2 a"),
        Selector::parse("span.companyName, [data-testid='company-name']"),
        Selector::parse("div.companyLocation, [data-testid='text-location']"),
    ) else {
        return vec![];
    };

    let document = Html::parse_document(html);
    document
        .select(&card)
        .filter_map(|element| {
            let anchor = element.select(&link).next()?;
            let href = anchor.value().attr("href").filter(|h| !h.trim().is_empty())?;
            let url = if href.starts_with("http") {
                href.to_string()
            } else {
                format!("{}/{}", base_url.trim_end_matches('/'), href.trim_start_matches('/'))
            };
            let role = anchor
                .value()
                .attr("title")
                .map(str::to_string)
                .or_else(|| first_text(&element, &link))?;
            let company = first_text(&element, &company);
            let place = first_text(&element, &place);

            let title = match &company {
                Some(company) => format!("{role} - {company}"),
                None => role,
            };
            Some(RawPosting {
                snippet: match &place {
                    Some(place) => format!("{title} - {place}"),
                    None => title.clone(),
                },
                title,
                url,
                published_at: None,
                geo_hint: place,
                source: INDEED_SOURCE.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use chrono::TimeZone;

    const INDEED_PAGE: &str = r#"<html><body>
        <div class="job_seen_beacon">
          <h2 class="jobTitle"><a href="/rc/clk?jk=abc123" title="Desenvolvedor Backend Pleno"><span>Desenvolvedor Backend Pleno</span></a></h2>
          <span class="companyName">Acme Tecnologia</span>
          <div class="companyLocation">Campinas, SP</div>
        </div>
        <div class="job_seen_beacon">
          <h2><a href="https://br.indeed.com/viewjob?jk=def456"><span>Analista de Dados</span></a></h2>
          <div class="companyLocation">Remoto</div>
        </div>
        <div class="job_seen_beacon">
          <h2><span>Sem link</span></h2>
        </div>
    </body></html>"#;

    /// Serves the fixture page for every request and records the URLs asked for.
    struct PageTransport {
        pages: Vec<Result<String, u16>>,
        requested: RefCell<Vec<String>>,
    }

    impl Transport for PageTransport {
        fn get(&self, url: &str) -> Result<String, FetchError> {
            let index = self.requested.borrow().len();
            self.requested.borrow_mut().push(url.to_string());
            match &self.pages[index] {
                Ok(html) => Ok(html.clone()),
                Err(status) => Err(FetchError::Status {
                    status: *status,
                    url: url.to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_parse_indeed_page() {
        let postings = parse_indeed_page(INDEED_PAGE, INDEED_BASE_URL);
        assert_eq!(postings.len(), 2);

        assert_eq!(postings[0].title, "Desenvolvedor Backend Pleno - Acme Tecnologia");
        assert_eq!(postings[0].url, "https://br.indeed.com/rc/clk?jk=abc123");
        assert_eq!(postings[0].geo_hint.as_deref(), Some("Campinas, SP"));
        assert_eq!(postings[0].source, "Indeed");

        assert_eq!(postings[1].title, "Analista de Dados");
        assert_eq!(postings[1].url, "https://br.indeed.com/viewjob?jk=def456");
        assert_eq!(postings[1].snippet, "Analista de Dados - Remoto");
    }

    #[test]
    fn test_parse_indeed_page_without_cards() {
        assert!(parse_indeed_page("<html><body>blocked</body></html>", INDEED_BASE_URL).is_empty());
    }

    #[test]
    fn test_indeed_feed_pages_skip_failures_and_dedup() {
        let transport = PageTransport {
            pages: vec![Ok(INDEED_PAGE.to_string()), Err(403), Ok(INDEED_PAGE.to_string())],
            requested: RefCell::new(vec![]),
        };
        let feed = IndeedFeed::new(
            Box::new(transport),
            INDEED_BASE_URL,
            "desenvolvedor",
            "Brasil",
            3,
            Duration::ZERO,
        );
        let postings = feed.postings();
        assert_eq!(postings.len(), 2);

        let url = feed.page_url(2).unwrap();
        assert_eq!(url.as_str(), "https://br.indeed.com/jobs?q=desenvolvedor&l=Brasil&start=20");
    }

    #[test]
    fn test_indeed_feed_caps_postings() {
        let cards: String = (0..30)
            .map(|i| format!(r#"<div class="job_seen_beacon"><h2><a href="/viewjob?jk={i}" title="Dev {i}"></a></h2></div>"#))
            .collect();
        let page = |offset: usize| {
            Ok(cards.replace("jk=", &format!("jk={offset}-")))
        };
        let transport = PageTransport {
            pages: vec![page(0), page(1), page(2)],
            requested: RefCell::new(vec![]),
        };
        let feed = IndeedFeed::new(Box::new(transport), INDEED_BASE_URL, "dev", "Brasil", 3, Duration::ZERO);
        assert_eq!(feed.postings().len(), INDEED_MAX_POSTINGS);
    }

    #[test]
    fn test_parse_listing() {
        let body = r#"{"data": [
            {"tituloVaga": "Programador PHP", "municipio": "Recife", "uf": "PE",
             "idVaga": 4412, "dataPublicacao": "2026-10-14T09:30:00"},
            {"tituloVaga": "Auxiliar Administrativo", "municipio": "", "uf": "SP", "idVaga": "ab-9"},
            {"tituloVaga": "", "idVaga": 1},
            {"tituloVaga": "Sem id"}
        ]}"#;
        let postings = parse_listing(body).unwrap();
        assert_eq!(postings.len(), 2);

        assert_eq!(postings[0].url, "https://www.trabalhabrasil.com.br/vagas/4412");
        assert_eq!(postings[0].geo_hint.as_deref(), Some("Recife - PE"));
        assert_eq!(postings[0].snippet, "Programador PHP - Recife - PE");
        assert_eq!(
            postings[0].published_at,
            Some(Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap())
        );

        assert_eq!(postings[1].url, "https://www.trabalhabrasil.com.br/vagas/ab-9");
        assert_eq!(postings[1].geo_hint.as_deref(), Some("SP"));
        assert_eq!(postings[1].published_at, None);
    }

    #[test]
    fn test_parse_listing_empty_and_malformed() {
        assert!(parse_listing("{}").unwrap().is_empty());
        assert!(parse_listing("not json").is_err());
    }
}
