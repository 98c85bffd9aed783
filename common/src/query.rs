//! Read-side filtering shared by the query service.

use serde::Deserialize;

use crate::model::JobRecord;
use crate::terms::fold;

/// Hard cap on records returned by one query.
pub const MAX_RESULTS: usize = 100;

/// `?q=&location=&level=`; empty values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobQuery {
    pub q: Option<String>,
    pub location: Option<String>,
    pub level: Option<String>,
}

fn needle(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(fold)
}

impl JobQuery {
    pub fn matches(&self, record: &JobRecord) -> bool {
        let q = needle(&self.q);
        let location = needle(&self.location);
        let level = needle(&self.level);

        if q.is_some_and(|q| !fold(&record.title).contains(&q)) {
            return false;
        }
        if location.is_some_and(|l| !fold(&record.location).contains(&l)) {
            return false;
        }
        if let Some(level) = level {
            let code = record.level.code();
            let label = fold(record.level.label_pt());
            if !code.contains(&level) && !label.contains(&level) {
                return false;
            }
        }
        true
    }
}

/// Filters, orders newest first and caps at [`MAX_RESULTS`].
pub fn search(records: Vec<JobRecord>, query: &JobQuery) -> Vec<JobRecord> {
    let mut hits: Vec<JobRecord> = records.into_iter().filter(|r| query.matches(r)).collect();
    hits.sort_by(|a, b| {
        b.date_posted
            .cmp(&a.date_posted)
            .then_with(|| b.scraped_at.cmp(&a.scraped_at))
    });
    hits.truncate(MAX_RESULTS);
    hits
}
