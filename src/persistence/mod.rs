// * Persistence Boundary
// * Record schema, the persisted-store collaborator interface, and the
// * multi-level deduplication that decides what reaches that store.

pub mod dedup;
pub mod schema;
pub mod store;

// * Re-exports for convenient access
pub use dedup::{
    DedupCoordinator, DedupDecision, DedupStateStats, DeduplicationState, DuplicateKind,
};
pub use schema::{NormalizedRecord, RawRecord, RawRecordBuilder};
pub use store::{
    AsyncResult, ContentStore, InMemoryContentStore, SimilarContent, StoreError, UpsertOutcome,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::refinery::validator::Validator;

    #[tokio::test]
    async fn test_integration_record_to_dedup() {
        let raw = RawRecord::builder("https://example.com/page", "An Integration Fixture")
            .content("Sample content for the schema-to-dedup integration test.")
            .build();

        let record = Validator::new(&PipelineConfig::default())
            .validate(&raw)
            .unwrap();

        let coordinator = DedupCoordinator::new(&PipelineConfig::default());
        let store = InMemoryContentStore::new();
        let mut state = DeduplicationState::new();

        let decision = coordinator.check(&record, &mut state, &store).await.unwrap();
        assert!(decision.is_unique());

        // * The host persists accepted records; the next batch then sees them
        store.upsert(&record).await.unwrap();
        let mut next_batch_state = DeduplicationState::new();
        let decision = coordinator
            .check(&record, &mut next_batch_state, &store)
            .await
            .unwrap();
        assert!(decision.is_duplicate());
    }
}
