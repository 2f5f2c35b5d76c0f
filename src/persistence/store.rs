// * Persisted-Store Collaborator Interface
// * The pipeline only ever queries the store during deduplication; writing
// * accepted records back is the host's job via upsert after a batch ends.
// * Whatever engine the host picks (Postgres, SQLite, an HTTP service)
// * implements this trait behind its own connection handling.

use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::fingerprint::{self, SimilarityConfig};
use crate::persistence::schema::NormalizedRecord;

/// Type alias for boxed async results from store implementations
pub type AsyncResult<T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send>>;

/// Errors surfaced by a persisted-store collaborator.
/// The pipeline never retries these; the affected record is rejected and
/// the batch continues.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Store write failed: {0}")]
    Write(String),
}

/// A similar-content match reported by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarContent {
    pub id: String,
    pub similarity: f64,
}

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub was_insert: bool,
}

/// Narrow interface the deduplication coordinator consumes
pub trait ContentStore: Send + Sync {
    /// True when a record with this normalized URL is already persisted
    fn exists_by_url(&self, normalized_url: &str) -> AsyncResult<bool>;

    /// Persisted records whose content scores at or above `threshold`
    /// against the query text (already in canonical form)
    fn find_similar_content(
        &self,
        normalized_text: &str,
        threshold: f64,
    ) -> AsyncResult<Vec<SimilarContent>>;

    /// Inserts or updates a record. Invoked by the host after the pipeline
    /// accepts a record, never by the pipeline itself.
    fn upsert(&self, record: &NormalizedRecord) -> AsyncResult<UpsertOutcome>;
}

/// In-memory store for tests and embedded hosts.
///
/// Uses the same similarity function as the in-batch dedup checks, so
/// in-memory and persisted verdicts always agree on the same pair of texts.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    rows: RwLock<Vec<StoredRow>>,
    similarity: SimilarityConfig,
}

#[derive(Debug, Clone)]
struct StoredRow {
    record: NormalizedRecord,
    normalized_content: Option<String>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_similarity(similarity: SimilarityConfig) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            similarity,
        }
    }

    /// Number of stored records
    pub fn count(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    /// Direct insert for seeding test fixtures, bypassing upsert semantics
    pub fn seed(&self, record: NormalizedRecord) {
        let normalized_content = record.content.as_deref().map(fingerprint::normalize_text);
        self.rows.write().unwrap().push(StoredRow {
            record,
            normalized_content,
        });
    }
}

impl ContentStore for InMemoryContentStore {
    fn exists_by_url(&self, normalized_url: &str) -> AsyncResult<bool> {
        let exists = self
            .rows
            .read()
            .unwrap()
            .iter()
            .any(|row| row.record.url == normalized_url);

        Box::pin(async move { Ok(exists) })
    }

    fn find_similar_content(
        &self,
        normalized_text: &str,
        threshold: f64,
    ) -> AsyncResult<Vec<SimilarContent>> {
        let matches: Vec<SimilarContent> = self
            .rows
            .read()
            .unwrap()
            .iter()
            .filter_map(|row| {
                let stored = row.normalized_content.as_deref()?;
                let similarity =
                    fingerprint::combined_similarity(normalized_text, stored, &self.similarity);
                (similarity >= threshold).then(|| SimilarContent {
                    id: row.record.url.clone(),
                    similarity,
                })
            })
            .collect();

        Box::pin(async move { Ok(matches) })
    }

    fn upsert(&self, record: &NormalizedRecord) -> AsyncResult<UpsertOutcome> {
        let normalized_content = record.content.as_deref().map(fingerprint::normalize_text);
        let row = StoredRow {
            record: record.clone(),
            normalized_content,
        };

        let mut rows = self.rows.write().unwrap();
        let was_insert = match rows.iter_mut().find(|r| r.record.url == row.record.url) {
            Some(existing) => {
                *existing = row;
                false
            }
            None => {
                rows.push(row);
                true
            }
        };

        Box::pin(async move { Ok(UpsertOutcome { was_insert }) })
    }
}

// * Implement the trait for Arc<InMemoryContentStore> to support shared ownership
impl ContentStore for std::sync::Arc<InMemoryContentStore> {
    fn exists_by_url(&self, normalized_url: &str) -> AsyncResult<bool> {
        (**self).exists_by_url(normalized_url)
    }

    fn find_similar_content(
        &self,
        normalized_text: &str,
        threshold: f64,
    ) -> AsyncResult<Vec<SimilarContent>> {
        (**self).find_similar_content(normalized_text, threshold)
    }

    fn upsert(&self, record: &NormalizedRecord) -> AsyncResult<UpsertOutcome> {
        (**self).upsert(record)
    }
}
