//! Job Query Server
//!
//! Serves the records written by the collector, filtered by title,
//! location and seniority, over a small REST API built on Axum.

mod routes;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use common::SupabaseSettings;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::routes::AppState;
use crate::store::RecordStore;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum StoreKind {
    File,
    Rest,
}

#[derive(Parser, Debug)]
#[command(name = "vagas-server", about = "Query API over collected job postings", version)]
struct Cli {
    #[arg(long, env = "VAGAS_BIND", default_value = "0.0.0.0:8000")]
    bind: String,

    #[arg(long, value_enum, env = "VAGAS_STORE", default_value_t = StoreKind::File)]
    store: StoreKind,

    #[arg(long, env = "VAGAS_JOBS_PATH", default_value = "data/vagas_do_dia.json")]
    jobs_path: PathBuf,

    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    #[arg(long, env = "SUPABASE_TABLE", default_value = SupabaseSettings::DEFAULT_TABLE)]
    supabase_table: String,
}

impl Cli {
    fn record_store(&self) -> Result<RecordStore> {
        Ok(match self.store {
            StoreKind::File => RecordStore::File(self.jobs_path.clone()),
            StoreKind::Rest => RecordStore::Rest {
                client: reqwest::Client::new(),
                settings: SupabaseSettings {
                    url: self.supabase_url.clone().context("SUPABASE_URL must be set")?,
                    service_key: self
                        .supabase_key
                        .clone()
                        .context("SUPABASE_SERVICE_ROLE_KEY must be set")?,
                    table: self.supabase_table.clone(),
                },
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vagas_server=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    info!("🚀 Starting Vagas API...");

    let store = cli.record_store()?;
    match &store {
        RecordStore::File(path) => info!("📂 Serving records from {}", path.display()),
        RecordStore::Rest { settings, .. } => info!("📂 Serving records from table {}", settings.table),
    }

    let app = routes::router(Arc::new(AppState { store }));

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    info!("🌐 Server running at http://{}", cli.bind);
    info!("   Try: curl 'http://{}/api/jobs?q=desenvolvedor'", cli.bind);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
