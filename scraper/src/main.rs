//! Brazilian Job Posting Collector
//!
//! Finds recent postings on Brazilian job boards through a search API,
//! keeps the relevant ones, reads their detail pages, classifies them and
//! stores normalized records in a JSON file or a Supabase table.

mod backup;
mod config;
mod direct;
mod embed;
mod error;
mod fetch;
mod geocode;
mod pipeline;
mod search;
mod sink;
mod sources;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use reqwest::blocking::Client;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::backup::{BackupEnvelope, DriveUploader};
use crate::config::{BackupArgs, Cli, CollectArgs, Command};

fn collect(args: &CollectArgs, client: Client) -> Result<()> {
    let mut ctx = config::build_context(args, client)?;
    info!(
        rules = ctx.classifier.rules_version(),
        "🔍 Starting job collection across {} sources...",
        ctx.sources.len()
    );

    let report = pipeline::run(&mut ctx, Utc::now());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn backup(args: &BackupArgs, client: Client) -> Result<()> {
    let settings = args.supabase.settings()?;
    info!("📦 Backing up table {}", settings.table);

    let rows = backup::fetch_rows(&client, &settings)?;
    let now = Utc::now();
    let envelope = BackupEnvelope::new(&settings.table, args.project.clone(), rows, now);
    let Some(path) = backup::write_backup(&args.dir, &envelope, now)? else {
        return Ok(());
    };

    if let (Some(folder), Some(token)) = (&args.drive_folder_id, &args.drive_token) {
        DriveUploader::new(client, folder.clone(), token.clone())
            .upload(&path)
            .context("Drive upload failed")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vagas_scraper=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let client = config::http_client()?;

    match &cli.command {
        Command::Collect(args) => collect(args, client),
        Command::Backup(args) => backup(args, client),
    }
}
