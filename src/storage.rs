//! Sled-based cache for summaries, keyed by URL.

use crate::summary::Summary;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    DbError(#[from] sled::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A stored summary with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSummary {
    /// The source URL
    pub url: String,
    /// When the summary was created
    pub created_at: DateTime<Utc>,
    /// The summary itself
    pub summary: Summary,
}

impl StoredSummary {
    /// Create a new stored summary
    pub fn new(url: String, summary: Summary) -> Self {
        Self {
            url,
            created_at: Utc::now(),
            summary,
        }
    }
}

/// Async persistence seam used by the pipeline.
///
/// The pipeline only ever reads one key and writes one key; everything
/// else on [`Storage`] is management surface for the CLI.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Look up the cached record for a URL.
    async fn get(&self, url: &str) -> Result<Option<StoredSummary>, StorageError>;
    /// Persist the record for a URL, replacing any previous one.
    async fn put(&self, url: &str, summary: &Summary) -> Result<(), StorageError>;
}

/// Sled-based storage for summaries.
///
/// Stores records keyed by URL hash for efficient retrieval.
#[derive(Clone)]
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    /// Open or create storage at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Store a summary for a URL
    pub fn store(&self, url: &str, summary: &Summary) -> Result<(), StorageError> {
        let key = Self::hash_url(url);
        let stored = StoredSummary::new(url.to_string(), summary.clone());
        let value = serde_json::to_vec(&stored)?;
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    /// Retrieve a summary by URL
    pub fn get(&self, url: &str) -> Result<Option<StoredSummary>, StorageError> {
        let key = Self::hash_url(url);
        match self.db.get(key.as_bytes())? {
            Some(data) => {
                let stored: StoredSummary = serde_json::from_slice(&data)?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    /// List all stored summaries
    pub fn list_all(&self) -> Result<Vec<StoredSummary>, StorageError> {
        let mut results = Vec::new();
        for item in self.db.iter() {
            let (_key, value) = item?;
            let stored: StoredSummary = serde_json::from_slice(&value)?;
            results.push(stored);
        }
        // Sort by created_at descending (newest first)
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    /// Delete a summary by URL
    pub fn delete(&self, url: &str) -> Result<bool, StorageError> {
        let key = Self::hash_url(url);
        let existed = self.db.remove(key.as_bytes())?.is_some();
        self.db.flush()?;
        Ok(existed)
    }

    /// Get the number of stored summaries
    pub fn count(&self) -> usize {
        self.db.len()
    }

    /// Create a hash of the URL for use as a key
    fn hash_url(url: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}

#[async_trait]
impl SummaryStore for Storage {
    async fn get(&self, url: &str) -> Result<Option<StoredSummary>, StorageError> {
        Storage::get(self, url)
    }

    async fn put(&self, url: &str, summary: &Summary) -> Result<(), StorageError> {
        self.store(url, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::RelatedArticle;

    fn sample_summary() -> Summary {
        Summary::new(
            "summary S".to_string(),
            42,
            vec![RelatedArticle {
                title: "A".to_string(),
                url: "https://other.com/a".to_string(),
                excerpt: "excerpt".to_string(),
            }],
        )
    }

    #[test]
    fn round_trips_a_summary() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        let url = "https://news.example/story";
        storage.store(url, &sample_summary()).unwrap();

        let stored = storage.get(url).unwrap().expect("entry should exist");
        assert_eq!(stored.url, url);
        assert_eq!(stored.summary, sample_summary());
    }

    #[test]
    fn absent_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        assert!(storage.get("https://nowhere.example/").unwrap().is_none());
    }

    #[test]
    fn delete_reports_whether_entry_existed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        let url = "https://news.example/story";
        storage.store(url, &sample_summary()).unwrap();

        assert!(storage.delete(url).unwrap());
        assert!(!storage.delete(url).unwrap());
        assert!(storage.get(url).unwrap().is_none());
    }

    #[test]
    fn list_all_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        storage.store("https://a.example/", &sample_summary()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        storage.store("https://b.example/", &sample_summary()).unwrap();

        let all = storage.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].url, "https://b.example/");
        assert_eq!(storage.count(), 2);
    }
}
