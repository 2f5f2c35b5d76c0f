// * titan-refine: deduplication & quality assurance for crawled content.
// * Sits between a crawl engine and its persisted store - validates, scores,
// * and dedups records so only new, acceptable content reaches storage.
// *
// * The crate is a library with no I/O of its own; the persisted store is a
// * collaborator behind the `ContentStore` trait and the host decides what
// * implements it.

pub mod config;
pub mod engine;
pub mod persistence;
pub mod pipeline;
pub mod refinery;

// * Flat re-exports so hosts can use titan_refine::BatchProcessor directly
pub use config::{ConfigError, PipelineConfig};
pub use persistence::dedup::{
    DedupCoordinator, DedupDecision, DeduplicationState, DuplicateKind,
};
pub use persistence::schema::{NormalizedRecord, RawRecord, RawRecordBuilder};
pub use persistence::store::{
    AsyncResult, ContentStore, InMemoryContentStore, SimilarContent, StoreError, UpsertOutcome,
};
pub use pipeline::{
    AcceptedRecord, BatchProcessor, BatchResult, BatchStats, CancelFlag, RejectedRecord,
    RejectionReason,
};
pub use refinery::quality::{Grade, QualityAssessment, QualityScorer};
pub use refinery::validator::{FieldError, FieldErrorKind, Validator};
