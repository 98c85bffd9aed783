//! Assembles the persisted record and scores its completeness.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::model::{Classification, FetchedPage, JobRecord, RawPosting, WorkModel};
use crate::relevance::detect_location;

pub const UNKNOWN: &str = "Não informado";

/// Descriptions shorter than this do not earn the length weight.
pub const MIN_DESCRIPTION_CHARS: usize = 200;

// Weights in hundredths; summed as integers so the score is exact.
pub const WEIGHT_DESCRIPTION: u32 = 30;
pub const WEIGHT_SKILLS: u32 = 20;
pub const WEIGHT_SALARY: u32 = 20;
pub const WEIGHT_LOCATION: u32 = 15;
pub const WEIGHT_WORK_MODEL: u32 = 15;

/// Job-board names that show up as the last segment of result titles.
const BOARD_SUFFIXES: &[&str] = &[
    "gupy", "linkedin", "vagas.com.br", "vagas.com", "indeed", "catho", "infojobs", "glassdoor",
    "programathor", "trampos",
];

/// Weighted completeness in `[0, 1]`.
pub fn quality_score(record: &JobRecord) -> f32 {
    let checks = [
        (record.description.chars().count() >= MIN_DESCRIPTION_CHARS, WEIGHT_DESCRIPTION),
        (!record.skills.is_empty(), WEIGHT_SKILLS),
        (record.salary_disclosed, WEIGHT_SALARY),
        (!record.location.trim().is_empty() && record.location != UNKNOWN, WEIGHT_LOCATION),
        (record.work_model != WorkModel::Unknown, WEIGHT_WORK_MODEL),
    ];
    let points: u32 = checks
        .iter()
        .filter(|(passed, _)| *passed)
        .map(|(_, weight)| weight)
        .sum();
    points.min(100) as f32 / 100.0
}

/// Stable id derived from the listing URL.
pub fn external_id(url: &str) -> String {
    let digest = Sha256::digest(url.trim().trim_end_matches('/').as_bytes());
    format!("{digest:x}")[..16].to_string()
}

fn is_board_name(segment: &str) -> bool {
    let lower = segment.trim().to_lowercase();
    BOARD_SUFFIXES.iter().any(|board| lower.contains(board))
}

/// Splits `Cargo - Empresa | Gupy` into the role and, if present, the company.
pub fn split_title(raw: &str) -> (String, Option<String>) {
    let segments: Vec<&str> = raw
        .split(" | ")
        .flat_map(|part| part.split(" - "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| !is_board_name(s))
        .collect();
    let Some((title, rest)) = segments.split_first() else {
        return (raw.trim().to_string(), None);
    };
    let company = rest
        .iter()
        .find(|s| detect_location(s).is_none())
        .map(|s| s.to_string());
    (title.to_string(), company)
}

/// A country, state or work-mode label rather than a `City - UF` place.
fn is_coarse(location: &str) -> bool {
    !location.contains(" - ")
}

/// Company from a board subdomain such as `acme.gupy.io`.
pub fn company_from_url(url: &str) -> Option<String> {
    let host = url.split("://").nth(1)?.split(['/', '?', '#']).next()?;
    let (sub, board) = host.split_once('.')?;
    if board == "gupy.io" && sub != "www" && sub != "portal" {
        Some(sub.replace('-', " "))
    } else {
        None
    }
}

/// Builds the persisted record for one posting.
pub fn normalize(
    posting: &RawPosting,
    page: &FetchedPage,
    classification: Classification,
    scraped_at: DateTime<Utc>,
) -> JobRecord {
    let (title, company) = split_title(&posting.title);
    let company = company
        .or_else(|| company_from_url(&posting.url))
        .unwrap_or_else(|| UNKNOWN.to_string());
    let description = if page.fetched {
        page.text.clone()
    } else {
        posting.snippet.clone()
    };
    let hint = posting.geo_hint.clone().filter(|hint| !hint.trim().is_empty());
    let detected = detect_location(&format!("{}\n{}", posting.title, posting.snippet));
    let location = match (hint, detected) {
        (Some(hint), Some(found)) if is_coarse(&hint) && !is_coarse(found) => found.to_string(),
        (Some(hint), _) => hint,
        (None, Some(found)) => found.to_string(),
        (None, None) => detect_location(&description)
            .map(String::from)
            .unwrap_or_else(|| UNKNOWN.to_string()),
    };

    let mut record = JobRecord {
        id: Uuid::new_v4(),
        external_id: external_id(&posting.url),
        title,
        company,
        location,
        level: classification.seniority,
        area: classification.area,
        work_model: classification.work_model,
        salary_min: classification.salary.min,
        salary_max: classification.salary.max,
        salary_currency: classification.salary.currency,
        salary_disclosed: classification.salary.disclosed,
        skills: classification.skills,
        description,
        url: posting.url.clone(),
        source: posting.source.clone(),
        date_posted: posting.published_at,
        scraped_at,
        quality_score: 0.0,
        embedding: None,
    };
    record.quality_score = quality_score(&record);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;

    fn posting() -> RawPosting {
        RawPosting {
            title: "Desenvolvedor Backend Pleno - Acme | Gupy".to_string(),
            url: "https://acme.gupy.io/jobs/123".to_string(),
            snippet: "Vaga remota para pessoa desenvolvedora em São Paulo".to_string(),
            published_at: None,
            geo_hint: None,
            source: "gupy".to_string(),
        }
    }

    fn page(text: &str) -> FetchedPage {
        FetchedPage {
            url: "https://acme.gupy.io/jobs/123".to_string(),
            text: text.to_string(),
            fetched: true,
            attempts: 1,
        }
    }

    #[test]
    fn test_split_title() {
        assert_eq!(
            split_title("Desenvolvedor Backend Pleno - Acme | Gupy"),
            ("Desenvolvedor Backend Pleno".to_string(), Some("Acme".to_string()))
        );
        assert_eq!(
            split_title("Analista de Dados - São Paulo - LinkedIn"),
            ("Analista de Dados".to_string(), None)
        );
        assert_eq!(split_title("QA Engineer"), ("QA Engineer".to_string(), None));
    }

    #[test]
    fn test_company_from_url() {
        assert_eq!(company_from_url("https://acme-tech.gupy.io/jobs/1"), Some("acme tech".to_string()));
        assert_eq!(company_from_url("https://www.linkedin.com/jobs/view/1"), None);
        assert_eq!(company_from_url("not a url"), None);
    }

    #[test]
    fn test_external_id_is_stable() {
        assert_eq!(external_id("https://a.gupy.io/jobs/1"), external_id("https://a.gupy.io/jobs/1/"));
        assert_ne!(external_id("https://a.gupy.io/jobs/1"), external_id("https://a.gupy.io/jobs/2"));
        assert_eq!(external_id("x").len(), 16);
    }

    #[test]
    fn test_normalize_complete_record_scores_one() {
        let text = format!(
            "{} Requisitos: Rust e PostgreSQL. Salário: R$ 10.000 - R$ 14.000. Trabalho remoto.",
            "Descrição longa da vaga. ".repeat(10)
        );
        let classification = Classifier::default().classify(&posting().title, &text);
        let record = normalize(&posting(), &page(&text), classification, Utc::now());
        assert_eq!(record.title, "Desenvolvedor Backend Pleno");
        assert_eq!(record.company, "Acme");
        assert_eq!(record.location, "São Paulo - SP");
        assert_eq!(record.quality_score, 1.0);
    }

    #[test]
    fn test_normalize_sentinel_page_uses_snippet() {
        let sentinel = FetchedPage::unavailable("https://acme.gupy.io/jobs/123", 3);
        let classification = Classifier::default().classify(&posting().title, &sentinel.text);
        let record = normalize(&posting(), &sentinel, classification, Utc::now());
        assert_eq!(record.description, posting().snippet);
        assert!(record.quality_score < 0.5);
    }

    #[test]
    fn test_normalize_location_priority() {
        let mut hinted = posting();
        hinted.geo_hint = Some("Brasil".to_string());
        let record = normalize(&hinted, &page(""), Classifier::default().classify("Dev", ""), Utc::now());
        assert_eq!(record.location, "São Paulo - SP");

        hinted.snippet = "Vaga aberta".to_string();
        let record = normalize(&hinted, &page(""), Classifier::default().classify("Dev", ""), Utc::now());
        assert_eq!(record.location, "Brasil");

        hinted.geo_hint = Some("Holambra - SP".to_string());
        hinted.snippet = "Vaga presencial em SP".to_string();
        let record = normalize(&hinted, &page(""), Classifier::default().classify("Dev", ""), Utc::now());
        assert_eq!(record.location, "Holambra - SP");

        hinted.geo_hint = None;
        hinted.snippet = "Vaga aberta".to_string();
        let record = normalize(&hinted, &page("Atuação em Recife"), Classifier::default().classify("Dev", ""), Utc::now());
        assert_eq!(record.location, "Recife - PE");
    }

    #[test]
    fn test_quality_score_bounded_and_deterministic() {
        let long = "x".repeat(500);
        let texts = ["", "curto", long.as_str(), "Python R$ 5.000 remoto"];
        for text in texts {
            let classification = Classifier::default().classify("Dev", text);
            let record = normalize(&posting(), &page(text), classification, Utc::now());
            let score = quality_score(&record);
            assert!((0.0..=1.0).contains(&score));
            assert_eq!(score, quality_score(&record));
            assert_eq!(score, record.quality_score);
        }
    }
}
