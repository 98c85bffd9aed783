//! Keyword matching shared by the relevance filter and the classifier.
//!
//! Text and terms are both folded (lowercase, Portuguese accents removed)
//! before matching, so `Sênior`, `senior` and `SENIOR` are the same term.
//! A term only matches on letter/digit boundaries: `sp` matches in
//! `Remoto - SP` but not in `Spring`.

use regex::Regex;

/// Lowercases and strips the accents that show up in Brazilian listings.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// One keyword compiled to match as a whole token.
#[derive(Debug, Clone)]
pub struct Term {
    pattern: Regex,
}

impl Term {
    pub fn new(text: &str) -> Self {
        let text = fold(text.trim());
        // Terms like `.com.br` carry their own leading boundary.
        let lead = if text.starts_with(char::is_alphanumeric) {
            r"(?:^|[^\p{L}\p{N}])"
        } else {
            ""
        };
        let pattern = Regex::new(&format!("{lead}({})", regex::escape(&text)))
            .expect("escaped literal is a valid pattern");
        Self { pattern }
    }

    /// Tests against text that has already been passed through [`fold`].
    pub fn is_match(&self, folded: &str) -> bool {
        !self.positions(folded).is_empty()
    }

    /// Byte offsets of every occurrence in already-folded text.
    pub fn positions(&self, folded: &str) -> Vec<usize> {
        // The trailing boundary is checked by hand so it is not consumed.
        self.pattern
            .captures_iter(folded)
            .filter_map(|caps| caps.get(1))
            .filter(|m| {
                !m.as_str().ends_with(char::is_alphanumeric)
                    || folded[m.end()..]
                        .chars()
                        .next()
                        .is_none_or(|c| !c.is_alphanumeric())
            })
            .map(|m| m.start())
            .collect()
    }
}

/// An unordered set of terms.
#[derive(Debug, Clone, Default)]
pub struct TermSet {
    terms: Vec<Term>,
}

impl TermSet {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms.into_iter().map(|t| Term::new(t.as_ref())).collect(),
        }
    }

    /// Number of distinct terms present in the folded text.
    pub fn count_distinct(&self, folded: &str) -> usize {
        self.terms.iter().filter(|t| t.is_match(folded)).count()
    }

    pub fn matches_any(&self, folded: &str) -> bool {
        self.terms.iter().any(|t| t.is_match(folded))
    }

    /// Byte offset of the earliest occurrence of any term.
    pub fn first_position(&self, folded: &str) -> Option<usize> {
        self.terms.iter().flat_map(|t| t.positions(folded)).min()
    }

    /// Distance in bytes from `at` to the closest occurrence of any term.
    pub fn nearest(&self, folded: &str, at: usize) -> Option<usize> {
        self.terms
            .iter()
            .flat_map(|t| t.positions(folded))
            .map(|pos| pos.abs_diff(at))
            .min()
    }
}
