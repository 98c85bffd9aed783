//! Where normalized records end up: a local JSON array or a Supabase table.

use std::fs;
use std::path::PathBuf;

use common::{JobRecord, SupabaseSettings};
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::SinkError;

pub trait RecordSink {
    fn save(&mut self, record: &JobRecord) -> Result<(), SinkError>;

    /// Short label for logs and the run report.
    fn describe(&self) -> String;
}

/// A JSON array on disk, rewritten through a temp file on every save.
pub struct JsonFileSink {
    path: PathBuf,
    records: Vec<JobRecord>,
}

impl JsonFileSink {
    /// In append mode records already in the file are kept; otherwise the
    /// file is replaced on the first save.
    pub fn open(path: impl Into<PathBuf>, append: bool) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let records = if append && path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                vec![]
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            vec![]
        };
        info!("📂 {} existing records in {}", records.len(), path.display());
        Ok(Self { path, records })
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        fs::write(&tmp, serde_json::to_string_pretty(&self.records)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RecordSink for JsonFileSink {
    fn save(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        if let Err(e) = self.flush() {
            self.records.pop();
            return Err(e);
        }
        debug!(external_id = %record.external_id, "record written");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Inserts rows through the PostgREST endpoint of a Supabase project.
pub struct RestSink {
    client: Client,
    settings: SupabaseSettings,
    upsert: bool,
}

impl RestSink {
    pub fn new(client: Client, settings: SupabaseSettings, upsert: bool) -> Self {
        Self {
            client,
            settings,
            upsert,
        }
    }

    pub fn endpoint(&self) -> String {
        let base = self.settings.table_endpoint();
        if self.upsert {
            format!("{base}?on_conflict=external_id")
        } else {
            base
        }
    }

    pub fn prefer_header(&self) -> &'static str {
        if self.upsert {
            "return=minimal,resolution=merge-duplicates"
        } else {
            "return=minimal"
        }
    }
}

impl RecordSink for RestSink {
    fn save(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("apikey", &self.settings.service_key)
            .header("Authorization", self.settings.bearer())
            .header("Prefer", self.prefer_header())
            .json(record)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                external_id: record.external_id.clone(),
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        debug!(external_id = %record.external_id, "row inserted");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("rest:{}", self.settings.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use chrono::Utc;
    use common::{FetchedPage, RawPosting};

    fn record(url: &str) -> JobRecord {
        let posting = RawPosting {
            title: "Desenvolvedor Rust".to_string(),
            url: url.to_string(),
            snippet: "Remoto".to_string(),
            published_at: None,
            geo_hint: None,
            source: "gupy".to_string(),
        };
        let page = FetchedPage::unavailable(url, 1);
        let classification = common::Classifier::default().classify(&posting.title, &posting.snippet);
        common::normalize(&posting, &page, classification, Utc::now())
    }

    fn read(path: &Path) -> Vec<JobRecord> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_file_sink_appends_to_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("vagas.json");

        let mut sink = JsonFileSink::open(&path, true).unwrap();
        sink.save(&record("https://a.gupy.io/jobs/1")).unwrap();
        drop(sink);

        let mut sink = JsonFileSink::open(&path, true).unwrap();
        assert_eq!(sink.records.len(), 1);
        sink.save(&record("https://a.gupy.io/jobs/2")).unwrap();

        let saved = read(&path);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].url, "https://a.gupy.io/jobs/2");
        assert!(!dir.path().join("data").join("vagas.json.tmp").exists());
    }

    #[test]
    fn test_file_sink_overwrite_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vagas.json");
        fs::write(&path, "[]").unwrap();

        let mut sink = JsonFileSink::open(&path, true).unwrap();
        sink.save(&record("https://a.gupy.io/jobs/1")).unwrap();

        let mut sink = JsonFileSink::open(&path, false).unwrap();
        assert!(sink.records.is_empty());
        sink.save(&record("https://a.gupy.io/jobs/9")).unwrap();
        let saved = read(&path);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].url, "https://a.gupy.io/jobs/9");
    }

    #[test]
    fn test_file_sink_rejects_corrupt_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vagas.json");
        fs::write(&path, "{ not an array").unwrap();
        assert!(matches!(JsonFileSink::open(&path, true), Err(SinkError::Json(_))));
    }

    #[test]
    fn test_file_sink_failed_write_keeps_memory_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vagas.json");
        let mut sink = JsonFileSink::open(&path, false).unwrap();
        // A directory in the way of the temp file makes the write fail.
        fs::create_dir(dir.path().join("vagas.json.tmp")).unwrap();
        assert!(sink.save(&record("https://a.gupy.io/jobs/1")).is_err());
        assert!(sink.records.is_empty());
    }

    #[test]
    fn test_rest_sink_upsert_settings() {
        let settings = SupabaseSettings {
            url: "https://abc.supabase.co".to_string(),
            service_key: "k".to_string(),
            table: "vagas".to_string(),
        };
        let insert = RestSink::new(Client::new(), settings.clone(), false);
        assert_eq!(insert.endpoint(), "https://abc.supabase.co/rest/v1/vagas");
        assert_eq!(insert.prefer_header(), "return=minimal");
        assert_eq!(insert.describe(), "rest:vagas");

        let upsert = RestSink::new(Client::new(), settings, true);
        assert_eq!(upsert.endpoint(), "https://abc.supabase.co/rest/v1/vagas?on_conflict=external_id");
        assert!(upsert.prefer_header().contains("merge-duplicates"));
    }
}
