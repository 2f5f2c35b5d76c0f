// * Multi-Level Deduplication
// * Fixed check order, cheapest first: batch-local URL fingerprint, then
// * batch-local content, then the persisted store (URL point query, then
// * similar-content query). The first match wins and nothing later runs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::engine::fingerprint::{self, SimilarityConfig};
use crate::persistence::schema::NormalizedRecord;
use crate::persistence::store::{ContentStore, StoreError};

/// Which level of the check detected the duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    /// URL fingerprint already seen earlier in this batch
    Url,
    /// Content matched a record seen earlier in this batch
    Content,
    /// Normalized URL already persisted
    StoreUrl,
    /// Content matched persisted records
    StoreContent,
}

/// Result of a duplicate check
#[derive(Debug, Clone)]
pub enum DedupDecision {
    /// Record is new at every level and was added to the batch state
    Unique,
    /// Record matched at some level; `reason` is the human-readable detail
    Duplicate { kind: DuplicateKind, reason: String },
}

impl DedupDecision {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DedupDecision::Duplicate { .. })
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, DedupDecision::Unique)
    }
}

/// Mutable deduplication state for exactly one batch run.
///
/// Owned by the caller and discarded when the batch ends - never a process
/// singleton, so concurrent batches each carry their own. Cross-batch
/// knowledge lives in the persisted store, not here.
#[derive(Debug, Default)]
pub struct DeduplicationState {
    seen_url_fingerprints: HashSet<u128>,
    seen_content_hashes: HashSet<u128>,
    // * Normalized texts in acceptance order, scanned for near-duplicates
    seen_content: Vec<String>,
}

impl DeduplicationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of what the state is tracking
    pub fn stats(&self) -> DedupStateStats {
        DedupStateStats {
            tracked_urls: self.seen_url_fingerprints.len(),
            tracked_texts: self.seen_content.len(),
        }
    }

    fn record_accepted(&mut self, record: &NormalizedRecord, normalized_content: Option<String>) {
        self.seen_url_fingerprints.insert(record.url_fingerprint);
        if let Some(hash) = record.content_hash {
            self.seen_content_hashes.insert(hash);
        }
        if let Some(text) = normalized_content {
            self.seen_content.push(text);
        }
    }
}

/// Statistics about batch-local deduplication state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupStateStats {
    pub tracked_urls: usize,
    pub tracked_texts: usize,
}

/// Runs the ordered duplicate checks for one record at a time
#[derive(Debug, Clone)]
pub struct DedupCoordinator {
    similarity_threshold: f64,
    similarity: SimilarityConfig,
}

impl DedupCoordinator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            similarity: SimilarityConfig {
                sequence_weight: config.sequence_weight,
                token_weight: config.token_weight,
                length_ratio_cutoff: config.length_ratio_cutoff,
            },
        }
    }

    /// Checks one record against the batch state and the persisted store.
    ///
    /// A unique record is recorded into `state` before returning, so the
    /// next record in the batch sees it. Store failures propagate; the
    /// caller decides what a failed lookup means for the record.
    pub async fn check(
        &self,
        record: &NormalizedRecord,
        state: &mut DeduplicationState,
        store: &dyn ContentStore,
    ) -> Result<DedupDecision, StoreError> {
        // * Level 1: URL fingerprint within this batch
        if state.seen_url_fingerprints.contains(&record.url_fingerprint) {
            tracing::info!(url = %record.url, "Duplicate detected: URL already processed");
            return Ok(DedupDecision::Duplicate {
                kind: DuplicateKind::Url,
                reason: "URL already processed".to_string(),
            });
        }

        let normalized_content = record.content.as_deref().map(fingerprint::normalize_text);

        // * Level 2: content within this batch - exact hash is an O(1)
        // * lookup, near-duplicates pay for a similarity scan
        if let Some(text) = normalized_content.as_deref() {
            let matches = self.count_in_memory_matches(record, text, state);
            if matches > 0 {
                tracing::info!(
                    url = %record.url,
                    matches,
                    "Duplicate detected: similar content in batch"
                );
                return Ok(DedupDecision::Duplicate {
                    kind: DuplicateKind::Content,
                    reason: format!("similar content found: {matches} matches"),
                });
            }
        }

        // * Level 3: URL point query against the persisted store
        if store.exists_by_url(&record.url).await? {
            tracing::info!(url = %record.url, "Duplicate detected: URL exists in database");
            return Ok(DedupDecision::Duplicate {
                kind: DuplicateKind::StoreUrl,
                reason: "URL exists in database".to_string(),
            });
        }

        // * Level 4: similar-content query against the persisted store
        if let Some(text) = normalized_content.as_deref() {
            let matches = store
                .find_similar_content(text, self.similarity_threshold)
                .await?;
            if !matches.is_empty() {
                tracing::info!(
                    url = %record.url,
                    matches = matches.len(),
                    "Duplicate detected: similar content in database"
                );
                return Ok(DedupDecision::Duplicate {
                    kind: DuplicateKind::StoreContent,
                    reason: format!("similar content in database: {} matches", matches.len()),
                });
            }
        }

        state.record_accepted(record, normalized_content);
        tracing::debug!(url = %record.url, "Record is unique at all levels");
        Ok(DedupDecision::Unique)
    }

    fn count_in_memory_matches(
        &self,
        record: &NormalizedRecord,
        normalized_content: &str,
        state: &DeduplicationState,
    ) -> usize {
        if let Some(hash) = record.content_hash {
            if state.seen_content_hashes.contains(&hash) {
                return 1;
            }
        }

        state
            .seen_content
            .iter()
            .filter(|seen| {
                fingerprint::combined_similarity(normalized_content, seen, &self.similarity)
                    >= self.similarity_threshold
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::store::InMemoryContentStore;

    fn coordinator() -> DedupCoordinator {
        DedupCoordinator::new(&PipelineConfig::default())
    }

    fn record(url: &str, content: Option<&str>) -> NormalizedRecord {
        NormalizedRecord {
            url: crate::engine::normalization::normalize_url(url),
            url_fingerprint: crate::engine::normalization::url_fingerprint(url),
            title: "Some Record".to_string(),
            content: content.map(String::from),
            content_hash: content.map(fingerprint::content_hash),
            summary: None,
            author: None,
            published_at: None,
            tags: Vec::new(),
            crawled_at: 1_750_000_000,
            source_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_unique_record_is_recorded() {
        let store = InMemoryContentStore::new();
        let mut state = DeduplicationState::new();

        let decision = coordinator()
            .check(&record("https://example.com/a", Some("first body")), &mut state, &store)
            .await
            .unwrap();

        assert!(decision.is_unique());
        assert_eq!(state.stats().tracked_urls, 1);
        assert_eq!(state.stats().tracked_texts, 1);
    }

    #[tokio::test]
    async fn test_url_level_fires_first() {
        let store = InMemoryContentStore::new();
        let mut state = DeduplicationState::new();
        let coordinator = coordinator();

        let first = record("https://example.com/a", Some("shared body text"));
        coordinator.check(&first, &mut state, &store).await.unwrap();

        // * Same URL, same content: the URL level must win the short-circuit
        let decision = coordinator.check(&first, &mut state, &store).await.unwrap();
        match decision {
            DedupDecision::Duplicate { kind, reason } => {
                assert_eq!(kind, DuplicateKind::Url);
                assert_eq!(reason, "URL already processed");
            }
            DedupDecision::Unique => panic!("expected a duplicate"),
        }
    }

    #[tokio::test]
    async fn test_exact_content_duplicate_across_urls() {
        let store = InMemoryContentStore::new();
        let mut state = DeduplicationState::new();
        let coordinator = coordinator();

        let body = "identical content body shared between two pages";
        coordinator
            .check(&record("https://example.com/a", Some(body)), &mut state, &store)
            .await
            .unwrap();

        let decision = coordinator
            .check(&record("https://example.com/b", Some(body)), &mut state, &store)
            .await
            .unwrap();

        match decision {
            DedupDecision::Duplicate { kind, reason } => {
                assert_eq!(kind, DuplicateKind::Content);
                assert!(reason.contains("similar content found"));
            }
            DedupDecision::Unique => panic!("expected a content duplicate"),
        }
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        // * A pair scoring exactly at the threshold is a duplicate; nudging
        // * the threshold just above the pair's score makes it unique
        let a = "the quick brown fox jumps over the lazy dog today";
        let b = "the quick brown fox jumps over the lazy dog yesterday";
        let score = fingerprint::combined_similarity(
            &fingerprint::normalize_text(a),
            &fingerprint::normalize_text(b),
            &SimilarityConfig::default(),
        );
        assert!(score > 0.0 && score < 1.0, "fixture pair must be a near-miss");

        let at_threshold = DedupCoordinator::new(&PipelineConfig {
            similarity_threshold: score,
            ..Default::default()
        });
        let store = InMemoryContentStore::new();
        let mut state = DeduplicationState::new();
        at_threshold
            .check(&record("https://example.com/a", Some(a)), &mut state, &store)
            .await
            .unwrap();
        let decision = at_threshold
            .check(&record("https://example.com/b", Some(b)), &mut state, &store)
            .await
            .unwrap();
        assert!(decision.is_duplicate(), "score == threshold must be a duplicate");

        let above_threshold = DedupCoordinator::new(&PipelineConfig {
            similarity_threshold: (score + 1e-6).min(1.0),
            ..Default::default()
        });
        let store = InMemoryContentStore::new();
        let mut state = DeduplicationState::new();
        above_threshold
            .check(&record("https://example.com/a", Some(a)), &mut state, &store)
            .await
            .unwrap();
        let decision = above_threshold
            .check(&record("https://example.com/b", Some(b)), &mut state, &store)
            .await
            .unwrap();
        assert!(decision.is_unique(), "score below threshold must be unique");
    }

    #[tokio::test]
    async fn test_store_url_level() {
        let store = InMemoryContentStore::new();
        store.seed(record("https://example.com/persisted", None));

        let mut state = DeduplicationState::new();
        let decision = coordinator()
            .check(&record("https://example.com/persisted", None), &mut state, &store)
            .await
            .unwrap();

        match decision {
            DedupDecision::Duplicate { kind, reason } => {
                assert_eq!(kind, DuplicateKind::StoreUrl);
                assert_eq!(reason, "URL exists in database");
            }
            DedupDecision::Unique => panic!("expected a store URL duplicate"),
        }
    }

    #[tokio::test]
    async fn test_store_content_level() {
        let store = InMemoryContentStore::new();
        store.seed(record(
            "https://example.com/persisted",
            Some("a body of text already sitting in the database"),
        ));

        let mut state = DeduplicationState::new();
        let decision = coordinator()
            .check(
                &record(
                    "https://example.com/fresh-url",
                    Some("a body of text already sitting in the database"),
                ),
                &mut state,
                &store,
            )
            .await
            .unwrap();

        match decision {
            DedupDecision::Duplicate { kind, reason } => {
                assert_eq!(kind, DuplicateKind::StoreContent);
                assert!(reason.contains("similar content in database: 1 matches"));
            }
            DedupDecision::Unique => panic!("expected a store content duplicate"),
        }
    }

    #[tokio::test]
    async fn test_records_without_content_skip_content_levels() {
        let store = InMemoryContentStore::new();
        let mut state = DeduplicationState::new();
        let coordinator = coordinator();

        coordinator
            .check(&record("https://example.com/a", None), &mut state, &store)
            .await
            .unwrap();
        let decision = coordinator
            .check(&record("https://example.com/b", None), &mut state, &store)
            .await
            .unwrap();

        assert!(decision.is_unique());
        assert_eq!(state.stats().tracked_texts, 0);
    }

    #[tokio::test]
    async fn test_duplicate_does_not_mutate_state() {
        let store = InMemoryContentStore::new();
        let mut state = DeduplicationState::new();
        let coordinator = coordinator();

        coordinator
            .check(&record("https://example.com/a", Some("one body")), &mut state, &store)
            .await
            .unwrap();
        coordinator
            .check(&record("https://example.com/a", Some("other body")), &mut state, &store)
            .await
            .unwrap();

        // * The rejected duplicate must not have been recorded
        assert_eq!(state.stats().tracked_urls, 1);
        assert_eq!(state.stats().tracked_texts, 1);
    }
}
