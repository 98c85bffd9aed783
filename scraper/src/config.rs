//! Command-line flags with environment fallbacks, and the wiring that turns
//! them into a [`PipelineContext`].

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use common::{Classifier, RelevanceFilter, SupabaseSettings};
use reqwest::blocking::Client;

use crate::direct::{self, IndeedFeed, PostingFeed, TrabalhaBrasilFeed};
use crate::embed::{self, Embedder, OpenAiEmbedder};
use crate::fetch::{DetailFetcher, HttpTransport, RetryPolicy};
use crate::geocode::{Geocoder, NOMINATIM_URL, NominatimLookup};
use crate::pipeline::PipelineContext;
use crate::search::{self, SerpApiClient};
use crate::sink::{JsonFileSink, RecordSink, RestSink};
use crate::sources::{self, QueryTemplate};

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; vagas-scraper/0.1; +https://github.com/vagas)";
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_JOBS_PATH: &str = "data/vagas_do_dia.json";

#[derive(Parser, Debug)]
#[command(name = "vagas-scraper", about = "Collects Brazilian job postings", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search, filter, classify and store postings
    Collect(CollectArgs),
    /// Dump the hosted table to a dated JSON file
    Backup(BackupArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SinkKind {
    /// JSON array on local disk
    File,
    /// Supabase table over PostgREST
    Rest,
}

#[derive(Args, Debug, Clone)]
pub struct SupabaseArgs {
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    #[arg(long, env = "SUPABASE_TABLE", default_value = SupabaseSettings::DEFAULT_TABLE)]
    pub supabase_table: String,
}

impl SupabaseArgs {
    pub fn settings(&self) -> Result<SupabaseSettings> {
        let url = self
            .supabase_url
            .clone()
            .filter(|v| !v.trim().is_empty())
            .context("SUPABASE_URL must be set")?;
        let service_key = self
            .supabase_key
            .clone()
            .filter(|v| !v.trim().is_empty())
            .context("SUPABASE_SERVICE_ROLE_KEY must be set")?;
        Ok(SupabaseSettings {
            url,
            service_key,
            table: self.supabase_table.clone(),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    /// Search keywords, comma separated
    #[arg(
        long = "keyword",
        env = "VAGAS_KEYWORDS",
        value_delimiter = ',',
        default_values = ["desenvolvedor", "programador", "engenheiro de software"]
    )]
    pub keywords: Vec<String>,

    /// Topical keywords a candidate must mention (default: technology roles)
    #[arg(long = "topic", value_delimiter = ',')]
    pub topics: Vec<String>,

    /// Restrict the run to these catalog sources
    #[arg(long = "source", value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Query template with {keywords}, {site}, {geo} and {after}
    #[arg(long, env = "VAGAS_QUERY_TEMPLATE", default_value = sources::DEFAULT_TEMPLATE)]
    pub template: String,

    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_key: Option<String>,

    #[arg(long, env = "SERPAPI_BASE_URL", default_value = search::DEFAULT_BASE_URL)]
    pub serpapi_base_url: String,

    /// Results kept per source query
    #[arg(long, default_value_t = 10)]
    pub max_results: usize,

    /// Only postings newer than this many days
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(i64).range(0..=3650))]
    pub recency_days: i64,

    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Base of the linear backoff between attempts
    #[arg(long, default_value_t = 2_000)]
    pub backoff_ms: u64,

    /// Pause before every detail page request
    #[arg(long, default_value_t = 1_500)]
    pub politeness_ms: u64,

    /// Also read the Trabalha Brasil listing API
    #[arg(long)]
    pub trabalha_brasil: bool,

    #[arg(long, default_value_t = 100)]
    pub trabalha_brasil_page_size: usize,

    /// Also scrape the Indeed Brasil search listing
    #[arg(long)]
    pub indeed: bool,

    #[arg(long, env = "INDEED_BASE_URL", default_value = direct::INDEED_BASE_URL)]
    pub indeed_base_url: String,

    #[arg(long, default_value = "desenvolvedor")]
    pub indeed_query: String,

    #[arg(long, default_value = "Brasil")]
    pub indeed_location: String,

    #[arg(long, default_value_t = 2)]
    pub indeed_pages: usize,

    /// Pause between Indeed listing pages
    #[arg(long, default_value_t = 5_000)]
    pub indeed_delay_ms: u64,

    /// Normalize locations through Nominatim
    #[arg(long)]
    pub geocode: bool,

    #[arg(long, default_value = "256")]
    pub geocode_cache: NonZeroUsize,

    #[arg(long, env = "NOMINATIM_URL", default_value = NOMINATIM_URL)]
    pub nominatim_url: String,

    /// Attach description embeddings to records
    #[arg(long)]
    pub embed: bool,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = embed::DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, env = "OPENAI_EMBEDDING_MODEL", default_value = embed::DEFAULT_MODEL)]
    pub embedding_model: String,

    #[arg(long, value_enum, default_value_t = SinkKind::File)]
    pub sink: SinkKind,

    #[arg(long, env = "VAGAS_JOBS_PATH", default_value = DEFAULT_JOBS_PATH)]
    pub output: PathBuf,

    /// Replace the output file instead of appending to it
    #[arg(long)]
    pub overwrite: bool,

    /// Merge rows with the same external_id instead of inserting
    #[arg(long)]
    pub upsert: bool,

    #[command(flatten)]
    pub supabase: SupabaseArgs,
}

impl CollectArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_backoff: Duration::from_millis(self.backoff_ms),
            politeness_delay: Duration::from_millis(self.politeness_ms),
        }
    }

    pub fn relevance_filter(&self) -> RelevanceFilter {
        if self.topics.is_empty() {
            RelevanceFilter::default()
        } else {
            RelevanceFilter::with_topics(&self.topics)
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BackupArgs {
    #[command(flatten)]
    pub supabase: SupabaseArgs,

    #[arg(long, env = "SUPABASE_PROJECT_REF")]
    pub project: Option<String>,

    /// Directory the backup file is written to
    #[arg(long, default_value = "backups")]
    pub dir: PathBuf,

    #[arg(long, env = "GOOGLE_DRIVE_FOLDER_ID")]
    pub drive_folder_id: Option<String>,

    #[arg(long, env = "GOOGLE_OAUTH_TOKEN", hide_env_values = true)]
    pub drive_token: Option<String>,
}

/// Shared blocking client for search, detail pages and stores.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")
}

fn build_sink(args: &CollectArgs, client: &Client) -> Result<Box<dyn RecordSink>> {
    Ok(match args.sink {
        SinkKind::File => Box::new(
            JsonFileSink::open(&args.output, !args.overwrite)
                .with_context(|| format!("failed to open {}", args.output.display()))?,
        ),
        SinkKind::Rest => Box::new(RestSink::new(client.clone(), args.supabase.settings()?, args.upsert)),
    })
}

pub fn build_context(args: &CollectArgs, client: Client) -> Result<PipelineContext> {
    let api_key = args
        .serpapi_key
        .clone()
        .filter(|v| !v.trim().is_empty())
        .context("SERPAPI_API_KEY must be set")?;
    let sources = sources::select(&args.sources)
        .map_err(|unknown| anyhow!("unknown sources: {}", unknown.join(", ")))?;

    let mut feeds: Vec<Box<dyn PostingFeed>> = Vec::new();
    if args.trabalha_brasil {
        feeds.push(Box::new(TrabalhaBrasilFeed::new(
            client.clone(),
            args.trabalha_brasil_page_size,
        )));
    }
    if args.indeed {
        feeds.push(Box::new(IndeedFeed::new(
            Box::new(HttpTransport::new(client.clone())),
            &args.indeed_base_url,
            &args.indeed_query,
            &args.indeed_location,
            args.indeed_pages,
            Duration::from_millis(args.indeed_delay_ms),
        )));
    }

    let geocoder = args.geocode.then(|| {
        let lookup = NominatimLookup::new(client.clone(), &args.nominatim_url);
        Geocoder::new(Box::new(lookup), args.geocode_cache)
    });

    let embedder: Option<Box<dyn Embedder>> = if args.embed {
        let key = args
            .openai_api_key
            .as_deref()
            .context("OPENAI_API_KEY must be set when --embed is used")?;
        Some(Box::new(OpenAiEmbedder::new(
            key,
            &args.openai_base_url,
            args.embedding_model.clone(),
            HTTP_TIMEOUT,
        )?))
    } else {
        None
    };

    Ok(PipelineContext {
        keywords: args.keywords.clone(),
        template: QueryTemplate::new(args.template.clone()),
        sources,
        recency_days: args.recency_days,
        search: Box::new(SerpApiClient::new(
            client.clone(),
            &args.serpapi_base_url,
            api_key,
            args.max_results,
        )),
        feeds,
        filter: args.relevance_filter(),
        fetcher: DetailFetcher::new(Box::new(HttpTransport::new(client.clone())), args.retry_policy()),
        classifier: Classifier::default(),
        geocoder,
        embedder,
        sink: build_sink(args, &client)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(extra: &[&str]) -> CollectArgs {
        let mut argv = vec!["vagas-scraper", "collect"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Collect(args) => args,
            other => panic!("expected collect, got {other:?}"),
        }
    }

    #[test]
    fn test_collect_flags() {
        let args = collect(&[
            "--keyword",
            "rust,golang",
            "--source",
            "gupy",
            "--max-attempts",
            "5",
            "--backoff-ms",
            "100",
            "--sink",
            "rest",
            "--upsert",
        ]);
        assert_eq!(args.keywords, vec!["rust", "golang"]);
        assert_eq!(args.sources, vec!["gupy"]);
        assert_eq!(args.sink, SinkKind::Rest);
        assert!(args.upsert);

        let policy = args.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(Cli::try_parse_from(["vagas-scraper", "collect", "--max-attempts", "0"]).is_err());
    }

    #[test]
    fn test_recency_days_bounded() {
        assert_eq!(collect(&["--recency-days", "30"]).recency_days, 30);
        for days in ["-1", "3651", "99999999999999"] {
            assert!(
                Cli::try_parse_from(["vagas-scraper", "collect", "--recency-days", days]).is_err(),
                "{days}"
            );
        }
    }

    #[test]
    fn test_custom_topics_replace_default_filter() {
        let args = collect(&["--topic", "vendedor"]);
        assert!(args.relevance_filter().topical("Vendedor externo"));
        assert!(!args.relevance_filter().topical("Desenvolvedor backend"));
    }

    #[test]
    fn test_supabase_settings_required() {
        let missing = SupabaseArgs {
            supabase_url: None,
            supabase_key: Some("k".to_string()),
            supabase_table: "vagas".to_string(),
        };
        let err = missing.settings().unwrap_err();
        assert!(err.to_string().contains("SUPABASE_URL must be set"));

        let present = SupabaseArgs {
            supabase_url: Some("https://abc.supabase.co".to_string()),
            ..missing
        };
        assert_eq!(present.settings().unwrap().table, "vagas");
    }

    #[test]
    fn test_build_context_rejects_unknown_source() {
        let mut args = collect(&["--source", "monster"]);
        args.serpapi_key = Some("key".to_string());
        let err = build_context(&args, Client::new()).err().unwrap();
        assert!(err.to_string().contains("monster"));
    }

    #[test]
    fn test_build_context_requires_search_key() {
        let mut args = collect(&[]);
        args.serpapi_key = None;
        let err = build_context(&args, Client::new()).err().unwrap();
        assert!(err.to_string().contains("SERPAPI_API_KEY"));
    }

    #[test]
    fn test_build_context_wires_feeds() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("vagas.json");
        let mut args = collect(&[
            "--indeed",
            "--indeed-pages",
            "3",
            "--trabalha-brasil",
            "--output",
            output.to_str().unwrap(),
        ]);
        args.serpapi_key = Some("key".to_string());
        assert_eq!(args.indeed_delay_ms, 5_000);
        let ctx = build_context(&args, Client::new()).unwrap();
        let names: Vec<&str> = ctx.feeds.iter().map(|feed| feed.name()).collect();
        assert_eq!(names, vec!["Trabalha Brasil", "Indeed"]);
    }
}
