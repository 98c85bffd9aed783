//! Where to look for postings and how to ask for them.

use chrono::NaiveDate;

/// One search restriction, e.g. `site:gupy.io` limited to `Brasil`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    pub name: &'static str,
    pub query_fragment: &'static str,
    pub geo: Option<&'static str>,
}

pub const CATALOG: &[Source] = &[
    Source { name: "gupy", query_fragment: "site:gupy.io", geo: Some("Brasil") },
    Source { name: "linkedin", query_fragment: "site:br.linkedin.com/jobs", geo: None },
    Source { name: "vagas", query_fragment: "site:vagas.com.br", geo: None },
    Source { name: "infojobs", query_fragment: "site:infojobs.com.br", geo: None },
    Source { name: "catho", query_fragment: "site:catho.com.br", geo: None },
    Source { name: "programathor", query_fragment: "site:programathor.com.br", geo: None },
    Source { name: "trampos", query_fragment: "site:trampos.co", geo: Some("Brasil") },
];

/// Catalog entries by name; an empty selection means the whole catalog.
/// Unknown names are returned as the error value.
pub fn select(names: &[String]) -> Result<Vec<Source>, Vec<String>> {
    if names.is_empty() {
        return Ok(CATALOG.to_vec());
    }
    let unknown: Vec<String> = names
        .iter()
        .filter(|n| !CATALOG.iter().any(|s| s.name.eq_ignore_ascii_case(n)))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(unknown);
    }
    Ok(CATALOG
        .iter()
        .filter(|s| names.iter().any(|n| s.name.eq_ignore_ascii_case(n)))
        .copied()
        .collect())
}

pub const DEFAULT_TEMPLATE: &str = "{keywords} {site} {geo} after:{after}";

/// A query with `{keywords}`, `{site}`, `{geo}` and `{after}` placeholders.
#[derive(Debug, Clone)]
pub struct QueryTemplate(String);

impl Default for QueryTemplate {
    fn default() -> Self {
        Self(DEFAULT_TEMPLATE.to_string())
    }
}

impl QueryTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(&self, keywords: &[String], source: &Source, after: NaiveDate) -> String {
        let quoted: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(|k| {
                if k.contains(char::is_whitespace) {
                    format!("\"{k}\"")
                } else {
                    k.to_string()
                }
            })
            .collect();
        let keywords = match quoted.len() {
            0 => String::new(),
            1 => quoted[0].clone(),
            _ => format!("({})", quoted.join(" OR ")),
        };
        self.0
            .replace("{keywords}", &keywords)
            .replace("{site}", source.query_fragment)
            .replace("{geo}", source.geo.unwrap_or(""))
            .replace("{after}", &after.format("%Y-%m-%d").to_string())
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
