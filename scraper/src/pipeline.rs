//! One collection run: search → filter → fetch → classify → normalize → save.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use common::normalize::{UNKNOWN, external_id};
use common::relevance::LOCATIONS;
use common::{Classifier, JobRecord, RawPosting, RelevanceFilter, Verdict, normalize};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::direct::PostingFeed;
use crate::embed::Embedder;
use crate::fetch::DetailFetcher;
use crate::geocode::Geocoder;
use crate::search::{SearchBackend, estimate_published};
use crate::sink::RecordSink;
use crate::sources::{QueryTemplate, Source};

/// Everything a run needs, built once at startup.
pub struct PipelineContext {
    pub keywords: Vec<String>,
    pub template: QueryTemplate,
    pub sources: Vec<Source>,
    pub recency_days: i64,
    pub search: Box<dyn SearchBackend>,
    pub feeds: Vec<Box<dyn PostingFeed>>,
    pub filter: RelevanceFilter,
    pub fetcher: DetailFetcher,
    pub classifier: Classifier,
    pub geocoder: Option<Geocoder>,
    pub embedder: Option<Box<dyn Embedder>>,
    pub sink: Box<dyn RecordSink>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub discovered: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub attempted: usize,
    pub saved: usize,
    pub errored: usize,
    pub unavailable: usize,
}

/// Search every source and drain every feed, in that order.
fn discover(ctx: &PipelineContext, now: DateTime<Utc>) -> Vec<RawPosting> {
    let after = (now - Duration::days(ctx.recency_days)).date_naive();
    let mut postings = Vec::new();

    for source in &ctx.sources {
        let query = ctx.template.render(&ctx.keywords, source, after);
        info!("🔍 Searching {}: {}", source.name, query);
        let hits = ctx.search.search(&query);
        info!("✅ {} results from {}", hits.len(), source.name);
        postings.extend(hits.into_iter().map(|hit| RawPosting {
            published_at: hit.date.as_deref().and_then(|raw| estimate_published(raw, now)),
            title: hit.title,
            url: hit.link,
            snippet: hit.snippet,
            geo_hint: source.geo.map(str::to_string),
            source: source.name.to_string(),
        }));
    }

    for feed in &ctx.feeds {
        info!("📡 Reading feed {}", feed.name());
        postings.extend(feed.postings());
    }
    postings
}

/// Canonical locations are left alone; anything else goes to the geocoder.
fn needs_geocoding(location: &str) -> bool {
    location != UNKNOWN && !LOCATIONS.iter().any(|(display, _)| *display == location)
}

fn enrich(ctx: &mut PipelineContext, record: &mut JobRecord) {
    if let Some(geocoder) = ctx.geocoder.as_mut() {
        if needs_geocoding(&record.location) {
            if let Some(resolved) = geocoder.resolve(&record.location) {
                record.location = resolved;
            }
        }
    }
    if let Some(embedder) = ctx.embedder.as_ref() {
        match embedder.embed(&format!("{}\n{}", record.title, record.description)) {
            Ok(vector) => record.embedding = Some(vector),
            Err(e) => warn!(url = %record.url, error = %e, "⚠️ Embedding failed"),
        }
    }
}

pub fn run(ctx: &mut PipelineContext, now: DateTime<Utc>) -> RunReport {
    let mut report = RunReport::default();
    let mut seen: HashSet<String> = HashSet::new();

    let postings = discover(ctx, now);
    report.discovered = postings.len();
    info!("🚀 {} candidates discovered, writing to {}", postings.len(), ctx.sink.describe());

    for posting in postings {
        if !seen.insert(external_id(&posting.url)) {
            report.duplicates += 1;
            debug!(url = %posting.url, "duplicate candidate skipped");
            continue;
        }

        match ctx.filter.evaluate(&posting.title, &posting.snippet, &posting.url) {
            Verdict::Accepted => {}
            Verdict::OutOfRegion(geo) => {
                report.rejected += 1;
                info!(
                    url = %posting.url,
                    regional = geo.regional,
                    foreign = geo.foreign,
                    "🚫 Rejected (region): {}",
                    posting.title
                );
                continue;
            }
            Verdict::OffTopic => {
                report.rejected += 1;
                info!(url = %posting.url, "🚫 Rejected (topic): {}", posting.title);
                continue;
            }
        }

        report.attempted += 1;
        let page = ctx.fetcher.fetch(&posting.url);
        if !page.fetched {
            report.unavailable += 1;
        }

        let body = if page.fetched {
            format!("{}\n{}", posting.snippet, page.text)
        } else {
            posting.snippet.clone()
        };
        let classification = ctx.classifier.classify(&posting.title, &body);
        let mut record = normalize(&posting, &page, classification, now);
        enrich(ctx, &mut record);

        match ctx.sink.save(&record) {
            Ok(()) => {
                report.saved += 1;
                info!(
                    level = record.level.code(),
                    quality = record.quality_score,
                    "💾 Saved: {} @ {}",
                    record.title,
                    record.company
                );
            }
            Err(e) => {
                report.errored += 1;
                warn!(url = %record.url, error = %e, "❌ Failed to save record");
            }
        }
    }

    info!(
        discovered = report.discovered,
        duplicates = report.duplicates,
        rejected = report.rejected,
        attempted = report.attempted,
        saved = report.saved,
        errored = report.errored,
        unavailable = report.unavailable,
        "🎉 Run finished"
    );
    report
}
