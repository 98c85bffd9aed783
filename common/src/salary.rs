//! Salary extraction from free text.
//!
//! Patterns are tried in priority order (range, ceiling, floor, single
//! value) and the first one that parses wins.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::SalaryRange;
use crate::terms::fold;

/// Amounts below this are read as thousands (`R$ 5 - 8` means 5k to 8k).
pub const THOUSANDS_SHORTHAND_BELOW: f64 = 100.0;

const CURRENCY: &str = r"(?P<cur>r\$|us\$|\$|€)";
const ANY_CURRENCY: &str = r"(?:r\$|us\$|\$|€)";
const AMOUNT: &str = r"\d{1,3}(?:[.,]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Range,
    Ceiling,
    Floor,
    Single,
}

static PATTERNS: LazyLock<Vec<(Shape, Regex)>> = LazyLock::new(|| {
    // `k` / `mil` suffixes land in `<name>k`
    let amount = |name: &str| format!(r"(?P<{name}>{AMOUNT})(?:\s*(?P<{name}k>k|mil)\b)?");
    let a = amount("a");
    let b = amount("b");
    [
        (
            Shape::Range,
            format!(r"{CURRENCY}\s*{a}\s*(?:-|–|—|\s(?:a|ate|e|to)\s)\s*(?:{ANY_CURRENCY}\s*)?{b}"),
        ),
        (Shape::Ceiling, format!(r"\b(?:ate|up to)\s*{CURRENCY}\s*{a}")),
        (
            Shape::Floor,
            format!(r"\b(?:a partir de|acima de|minimo de|from)\s*{CURRENCY}\s*{a}"),
        ),
        (Shape::Single, format!(r"{CURRENCY}\s*{a}")),
    ]
    .into_iter()
    .map(|(shape, pattern)| {
        let regex = Regex::new(&pattern).expect("salary pattern compiles");
        (shape, regex)
    })
    .collect()
});

/// Parses `5.000`, `5,000.00`, `5.000,00`, `3,5` and `7.5` into a number.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let normalized = match (raw.rfind('.'), raw.rfind(',')) {
        (Some(dot), Some(comma)) => {
            if dot > comma {
                raw.replace(',', "")
            } else {
                raw.replace('.', "").replace(',', ".")
            }
        }
        (Some(_), None) => normalize_single_separator(raw, '.'),
        (None, Some(_)) => normalize_single_separator(raw, ','),
        (None, None) => raw.to_string(),
    };
    normalized.parse::<f64>().ok()
}

fn normalize_single_separator(raw: &str, sep: char) -> String {
    let mut groups = raw.split(sep);
    groups.next();
    if groups.all(|g| g.len() == 3) {
        raw.replace(sep, "")
    } else {
        raw.replace(sep, ".")
    }
}

fn currency_code(symbol: &str) -> &'static str {
    match symbol {
        "r$" => "BRL",
        "€" => "EUR",
        _ => "USD",
    }
}

/// The amount in `name` with its `k`/`mil` suffix applied, plus whether
/// the suffix was present.
fn amount_at(caps: &Captures, name: &str) -> Option<(f64, bool)> {
    let value = parse_amount(caps.name(name)?.as_str())?;
    let thousands = caps.name(&format!("{name}k")).is_some();
    Some(if thousands { (value * 1000.0, true) } else { (value, false) })
}

/// `5 - 8k` carries the suffix on one end only; the bare end shares it.
fn share_suffix(a: (f64, bool), b: (f64, bool)) -> (f64, f64) {
    let lift = |(value, suffixed): (f64, bool), other_suffixed: bool| {
        if !suffixed && other_suffixed && value < THOUSANDS_SHORTHAND_BELOW {
            value * 1000.0
        } else {
            value
        }
    };
    (lift(a, b.1), lift(b, a.1))
}

/// Scales both ends together so a range never mixes units.
fn scale_pair(min: Option<f64>, max: Option<f64>) -> (Option<i64>, Option<i64>) {
    let larger = min.into_iter().chain(max).fold(f64::MIN, f64::max);
    let factor = if larger < THOUSANDS_SHORTHAND_BELOW { 1000.0 } else { 1.0 };
    let scaled = |v: Option<f64>| v.map(|v| (v * factor).round() as i64);
    match (scaled(min), scaled(max)) {
        (Some(lo), Some(hi)) if lo > hi => (Some(hi), Some(lo)),
        pair => pair,
    }
}

/// First salary mention in the text, or `None` when nothing parses.
pub fn extract_salary(text: &str) -> Option<SalaryRange> {
    let folded = fold(text);
    PATTERNS.iter().find_map(|(shape, regex)| {
        let caps = regex.captures(&folded)?;
        let currency = currency_code(caps.name("cur")?.as_str());
        let a = amount_at(&caps, "a")?;
        let (min, max) = match shape {
            Shape::Range => {
                let (lo, hi) = share_suffix(a, amount_at(&caps, "b")?);
                scale_pair(Some(lo), Some(hi))
            }
            Shape::Ceiling => scale_pair(None, Some(a.0)),
            Shape::Floor => scale_pair(Some(a.0), None),
            Shape::Single => scale_pair(Some(a.0), Some(a.0)),
        };
        if min.unwrap_or(0) <= 0 && max.unwrap_or(0) <= 0 {
            return None;
        }
        Some(SalaryRange {
            min,
            max,
            currency: currency.to_string(),
            disclosed: true,
        })
    })
}
