//! File-backed cache for analytics results and their summaries.
//!
//! Entries live under `{data_dir}/analytics/` as pretty-printed JSON, one
//! file per request fingerprint. Reads never fail: a missing, unreadable or
//! corrupt entry is a miss.

pub mod error;
pub mod fingerprint;

use std::path::{Path, PathBuf};

use hfmon_analytics::{AnalyticsResult, SummaryReport};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use error::CacheError;
pub use fingerprint::{fingerprint, fingerprint_of, MAX_FINGERPRINT_LEN};

const SUMMARY_SUFFIX: &str = "_summary";

#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join("analytics"),
        }
    }

    /// Directory holding the cache files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn get(&self, fingerprint: &str) -> Option<AnalyticsResult> {
        self.read(&self.entry_path(fingerprint, "")).await
    }

    /// Store `analytics` under `fingerprint`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the entry cannot be serialized or written.
    pub async fn put(&self, fingerprint: &str, analytics: &AnalyticsResult) -> Result<(), CacheError> {
        self.write(fingerprint, "", analytics).await
    }

    pub async fn get_summary(&self, fingerprint: &str) -> Option<SummaryReport> {
        self.read(&self.entry_path(fingerprint, SUMMARY_SUFFIX)).await
    }

    /// # Errors
    ///
    /// Returns [`CacheError`] if the entry cannot be serialized or written.
    pub async fn put_summary(&self, fingerprint: &str, summary: &SummaryReport) -> Result<(), CacheError> {
        self.write(fingerprint, SUMMARY_SUFFIX, summary).await
    }

    fn entry_path(&self, fingerprint: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{fingerprint}{suffix}.json"))
    }

    async fn read<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache entry unreadable; treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => {
                tracing::debug!(path = %path.display(), "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache entry corrupt; treating as miss");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, fingerprint: &str, suffix: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(value).map_err(|source| CacheError::Serialize {
            fingerprint: fingerprint.to_string(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CacheError::Io {
                path: self.dir.display().to_string(),
                source,
            })?;

        let path = self.entry_path(fingerprint, suffix);
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| CacheError::Io {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "cache entry written");
        Ok(())
    }
}
