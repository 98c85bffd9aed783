//! Accept/reject decisions for search candidates.
//!
//! A candidate must pass both checks: it has to look Brazilian (enough
//! regional terms, no foreign ones) and it has to be about the target job
//! category.

use std::sync::LazyLock;

use crate::terms::{TermSet, fold};

/// Regional terms needed for the geographic check to pass.
pub const MIN_REGIONAL_HITS: usize = 1;
/// Foreign-term count must stay strictly below this.
pub const MAX_FOREIGN_HITS: usize = 1;

/// Display form and matching terms for places we recognise.
pub const LOCATIONS: &[(&str, &[&str])] = &[
    ("São Paulo - SP", &["sao paulo"]),
    ("Rio de Janeiro - RJ", &["rio de janeiro"]),
    ("Belo Horizonte - MG", &["belo horizonte"]),
    ("Curitiba - PR", &["curitiba"]),
    ("Porto Alegre - RS", &["porto alegre"]),
    ("Florianópolis - SC", &["florianopolis", "floripa"]),
    ("Recife - PE", &["recife"]),
    ("Salvador - BA", &["salvador"]),
    ("Fortaleza - CE", &["fortaleza"]),
    ("Brasília - DF", &["brasilia"]),
    ("Campinas - SP", &["campinas"]),
    ("Goiânia - GO", &["goiania"]),
    ("Manaus - AM", &["manaus"]),
    ("Vitória - ES", &["vitoria"]),
    ("SP", &["sp"]),
    ("RJ", &["rj"]),
    ("MG", &["mg", "minas gerais"]),
    ("PR", &["pr", "parana"]),
    ("RS", &["rs", "rio grande do sul"]),
    ("SC", &["sc", "santa catarina"]),
    ("PE", &["pe", "pernambuco"]),
    ("BA", &["ba", "bahia"]),
    ("DF", &["df", "distrito federal"]),
    ("Remoto", &["remoto", "home office"]),
    ("Brasil", &["brasil", "brazil", ".com.br", "pt-br"]),
];

const FOREIGN: &[&str] = &[
    "portugal", "lisboa", "lisbon", "espanha", "spain", "madrid", "mexico", "argentina",
    "buenos aires", "colombia", "bogota", "chile", "usa", "united states", "estados unidos", "eua",
    "canada", "europe", "europa", "uk", "united kingdom", "london", "londres", "germany",
    "alemanha", "berlin", "india", "new york",
];

const TECHNOLOGY: &[&str] = &[
    "desenvolvedor", "desenvolvedora", "developer", "programador", "programadora",
    "engenheiro de software", "engenheira de software", "software engineer", "backend",
    "back-end", "frontend", "front-end", "full stack", "fullstack", "devops", "sre", "dados",
    "data engineer", "data scientist", "qa", "tecnologia", "ti", "analista de sistemas", "mobile",
    "cloud",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoCheck {
    pub regional: usize,
    pub foreign: usize,
}

impl GeoCheck {
    pub fn passed(&self) -> bool {
        self.regional >= MIN_REGIONAL_HITS && self.foreign < MAX_FOREIGN_HITS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    OutOfRegion(GeoCheck),
    OffTopic,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    regional: TermSet,
    foreign: TermSet,
    topical: TermSet,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::with_topics(TECHNOLOGY)
    }
}

impl RelevanceFilter {
    /// Brazilian geography with a custom topical keyword set.
    pub fn with_topics<S: AsRef<str>>(topics: &[S]) -> Self {
        Self {
            regional: TermSet::new(LOCATIONS.iter().flat_map(|(_, terms)| terms.iter())),
            foreign: TermSet::new(FOREIGN),
            topical: TermSet::new(topics),
        }
    }

    pub fn geographic(&self, text: &str) -> GeoCheck {
        let folded = fold(text);
        GeoCheck {
            regional: self.regional.count_distinct(&folded),
            foreign: self.foreign.count_distinct(&folded),
        }
    }

    pub fn topical(&self, text: &str) -> bool {
        self.topical.matches_any(&fold(text))
    }

    /// Geography is judged on everything we know; topic on title and snippet.
    pub fn evaluate(&self, title: &str, snippet: &str, url: &str) -> Verdict {
        let geo = self.geographic(&format!("{title}\n{snippet}\n{url}"));
        if !geo.passed() {
            return Verdict::OutOfRegion(geo);
        }
        if !self.topical(&format!("{title}\n{snippet}")) {
            return Verdict::OffTopic;
        }
        Verdict::Accepted
    }
}

static LOCATION_TERMS: LazyLock<Vec<(&'static str, TermSet)>> = LazyLock::new(|| {
    LOCATIONS
        .iter()
        .map(|(display, terms)| (*display, TermSet::new(terms.iter())))
        .collect()
});

/// Display name of the first known place mentioned in the text.
pub fn detect_location(text: &str) -> Option<&'static str> {
    let folded = fold(text);
    LOCATION_TERMS
        .iter()
        .find(|(_, terms)| terms.matches_any(&folded))
        .map(|(display, _)| *display)
}
