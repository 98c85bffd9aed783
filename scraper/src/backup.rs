//! `backup` subcommand: dump the hosted table to a dated JSON file and,
//! optionally, push it to a Google Drive folder.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::SupabaseSettings;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub table: String,
    pub backup_date: DateTime<Utc>,
    pub total_records: usize,
    pub project: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupEnvelope {
    pub metadata: BackupMetadata,
    pub data: Vec<Value>,
}

impl BackupEnvelope {
    pub fn new(table: &str, project: Option<String>, rows: Vec<Value>, now: DateTime<Utc>) -> Self {
        Self {
            metadata: BackupMetadata {
                table: table.to_string(),
                backup_date: now,
                total_records: rows.len(),
                project,
            },
            data: rows,
        }
    }
}

pub fn backup_file_name(table: &str, now: DateTime<Utc>) -> String {
    format!("backup_{}_{}.json", table, now.format("%Y%m%d_%H%M%S"))
}

/// Rows are paged in primary-key order.
const BACKUP_ORDER: &str = "id.asc";

fn page_request(client: &Client, settings: &SupabaseSettings, offset: usize) -> RequestBuilder {
    client
        .get(settings.table_endpoint())
        .query(&SupabaseSettings::page_query(BACKUP_ORDER, offset))
        .header("apikey", &settings.service_key)
        .header("Authorization", settings.bearer())
}

/// Every row of the table, paged with `limit`/`offset`.
pub fn fetch_rows(client: &Client, settings: &SupabaseSettings) -> Result<Vec<Value>> {
    let mut rows = Vec::new();
    loop {
        let response = page_request(client, settings, rows.len())
            .send()
            .with_context(|| format!("failed to query table {}", settings.table))?
            .error_for_status()
            .with_context(|| format!("table {} returned an error", settings.table))?;
        let page: Vec<Value> = response
            .json()
            .context("table response was not a JSON array")?;
        let done = page.len() < SupabaseSettings::PAGE_SIZE;
        rows.extend(page);
        if done {
            return Ok(rows);
        }
    }
}

/// Writes the envelope under `dir`. An empty table writes nothing.
pub fn write_backup(dir: &Path, envelope: &BackupEnvelope, now: DateTime<Utc>) -> Result<Option<PathBuf>> {
    if envelope.data.is_empty() {
        warn!("⚠️ Table {} is empty, no backup written", envelope.metadata.table);
        return Ok(None);
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(backup_file_name(&envelope.metadata.table, now));
    fs::write(&path, serde_json::to_string_pretty(envelope)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        "💾 Backup of {} records saved to {}",
        envelope.metadata.total_records,
        path.display()
    );
    Ok(Some(path))
}

/// Uploads files into one Drive folder with an OAuth access token.
pub struct DriveUploader {
    client: Client,
    folder_id: String,
    token: String,
}

impl DriveUploader {
    pub fn new(client: Client, folder_id: String, token: String) -> Self {
        Self {
            client,
            folder_id,
            token,
        }
    }

    /// Creates the file entry, then sends its content. Returns the Drive id.
    pub fn upload(&self, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("backup path has no file name")?;
        let content = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        let created: DriveFile = self
            .client
            .post(DRIVE_FILES_URL)
            .bearer_auth(&self.token)
            .json(&json!({
                "name": name,
                "parents": [self.folder_id],
                "mimeType": "application/json",
            }))
            .send()
            .context("failed to create Drive file")?
            .error_for_status()
            .context("Drive refused file creation")?
            .json()
            .context("unexpected Drive response")?;

        self.client
            .patch(format!("{DRIVE_UPLOAD_URL}/{}", created.id))
            .query(&[("uploadType", "media")])
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .body(content)
            .send()
            .context("failed to upload backup content")?
            .error_for_status()
            .context("Drive refused backup content")?;

        info!("☁️ Uploaded {} to Drive as {}", name, created.id);
        Ok(created.id)
    }
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 7, 5, 9).unwrap()
    }

    #[test]
    fn test_page_request_orders_by_id() {
        let settings = SupabaseSettings {
            url: "https://abc.supabase.co".to_string(),
            service_key: "k".to_string(),
            table: "vagas".to_string(),
        };
        let request = page_request(&Client::new(), &settings, 1_000).build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://abc.supabase.co/rest/v1/vagas?select=*&order=id.asc&limit=1000&offset=1000"
        );
    }

    #[test]
    fn test_backup_file_name() {
        assert_eq!(backup_file_name("vagas", now()), "backup_vagas_20261016_070509.json");
    }

    #[test]
    fn test_write_backup_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![json!({"title": "Dev"}), json!({"title": "QA"})];
        let envelope = BackupEnvelope::new("vagas", Some("abc".to_string()), rows, now());

        let path = write_backup(dir.path(), &envelope, now()).unwrap().unwrap();
        assert!(path.ends_with("backup_vagas_20261016_070509.json"));

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["metadata"]["table"], "vagas");
        assert_eq!(written["metadata"]["total_records"], 2);
        assert_eq!(written["metadata"]["project"], "abc");
        assert_eq!(written["data"][1]["title"], "QA");
    }

    #[test]
    fn test_write_backup_skips_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let envelope = BackupEnvelope::new("vagas", None, vec![], now());
        assert!(write_backup(dir.path(), &envelope, now()).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
