// * Batch Processor
// * Drives Validate -> Quality -> Dedup over one batch of raw records.
// * Records are strictly sequential: a record's duplicate status may depend
// * on records earlier in the same batch, so nothing here is parallel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, PipelineConfig};
use crate::persistence::dedup::{
    DedupCoordinator, DedupDecision, DeduplicationState, DuplicateKind,
};
use crate::persistence::schema::{NormalizedRecord, RawRecord};
use crate::persistence::store::ContentStore;
use crate::refinery::quality::{QualityAssessment, QualityScorer};
use crate::refinery::validator::{FieldError, Validator};

/// Cooperative cancellation flag, checked once per record boundary.
/// Cloning shares the flag; cancelling any clone stops the batch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A record that survived the full pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedRecord {
    pub record: NormalizedRecord,
    pub quality: QualityAssessment,
}

/// Why a record was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RejectionReason {
    /// One or more schema rules failed
    Validation { errors: Vec<FieldError> },
    /// Quality score below the configured minimum
    Quality { assessment: QualityAssessment },
    /// One of the four deduplication levels matched
    Duplicate { kind: DuplicateKind, detail: String },
    /// The persisted-store lookup failed; the record is rejected rather
    /// than risking a duplicate reaching storage
    Store { detail: String },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::Validation { errors } => {
                write!(f, "validation failed: {} field error(s)", errors.len())
            }
            RejectionReason::Quality { assessment } => {
                write!(f, "quality score {} below minimum", assessment.score)
            }
            RejectionReason::Duplicate { detail, .. } => write!(f, "{detail}"),
            RejectionReason::Store { detail } => {
                write!(f, "database lookup error: {detail}")
            }
        }
    }
}

/// A rejected record with its original input preserved for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub record: RawRecord,
    pub reason: RejectionReason,
}

/// Exact per-batch counters - counted, never sampled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub input_count: usize,
    pub valid_count: usize,
    pub quality_passed_count: usize,
    pub duplicate_url_count: usize,
    pub duplicate_content_count: usize,
    pub duplicate_store_count: usize,
    pub store_error_count: usize,
    pub final_accepted_count: usize,
}

impl BatchStats {
    /// Total duplicates across all levels
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_url_count + self.duplicate_content_count + self.duplicate_store_count
    }
}

/// Output of one pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub accepted: Vec<AcceptedRecord>,
    pub rejected: Vec<RejectedRecord>,
    pub stats: BatchStats,
    /// True when the run was cancelled at a record boundary; everything
    /// processed up to that point is present
    pub partial: bool,
}

impl BatchResult {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// The pipeline driver. One instance serves many batches; each `process`
/// call owns its own `DeduplicationState`.
pub struct BatchProcessor<S: ContentStore> {
    validator: Validator,
    scorer: QualityScorer,
    coordinator: DedupCoordinator,
    min_quality_score: u8,
    store: S,
}

impl<S: ContentStore> BatchProcessor<S> {
    /// Validates the configuration up front - bad thresholds never get to
    /// process a single record.
    pub fn new(config: PipelineConfig, store: S) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            validator: Validator::new(&config),
            scorer: QualityScorer::new(&config),
            coordinator: DedupCoordinator::new(&config),
            min_quality_score: config.min_quality_score,
            store,
        })
    }

    /// The store this processor queries during deduplication
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Processes a batch to completion
    pub async fn process(&self, records: Vec<RawRecord>) -> BatchResult {
        self.process_with_cancel(records, &CancelFlag::new()).await
    }

    /// Processes a batch, checking `cancel` once per record boundary.
    /// No record is ever left half-processed: the current record finishes
    /// its disposition before the flag is consulted again.
    pub async fn process_with_cancel(
        &self,
        records: Vec<RawRecord>,
        cancel: &CancelFlag,
    ) -> BatchResult {
        let mut state = DeduplicationState::new();
        let mut result = BatchResult::default();
        result.stats.input_count = records.len();

        tracing::debug!(input = records.len(), "Batch started");

        let mut remaining = records.len();
        for raw in records {
            if cancel.is_cancelled() {
                result.partial = true;
                tracing::info!(
                    unprocessed = remaining,
                    "Batch cancelled at record boundary"
                );
                break;
            }
            remaining -= 1;

            self.process_record(raw, &mut state, &mut result).await;
        }

        result.stats.final_accepted_count = result.accepted.len();
        tracing::info!(
            input = result.stats.input_count,
            accepted = result.stats.final_accepted_count,
            rejected = result.rejected.len(),
            duplicates = result.stats.duplicate_count(),
            partial = result.partial,
            "Batch complete"
        );

        result
    }

    async fn process_record(
        &self,
        raw: RawRecord,
        state: &mut DeduplicationState,
        result: &mut BatchResult,
    ) {
        // * Stage 1: validation
        let record = match self.validator.validate(&raw) {
            Ok(record) => record,
            Err(errors) => {
                tracing::debug!(url = %raw.url, errors = errors.len(), "Record failed validation");
                result.rejected.push(RejectedRecord {
                    record: raw,
                    reason: RejectionReason::Validation { errors },
                });
                return;
            }
        };
        result.stats.valid_count += 1;

        // * Stage 2: quality gate
        let quality = self.scorer.assess(&record);
        if quality.score < self.min_quality_score {
            tracing::debug!(
                url = %record.url,
                score = quality.score,
                minimum = self.min_quality_score,
                "Record failed the quality gate"
            );
            result.rejected.push(RejectedRecord {
                record: raw,
                reason: RejectionReason::Quality {
                    assessment: quality,
                },
            });
            return;
        }
        result.stats.quality_passed_count += 1;

        // * Stage 3: deduplication - the only stage that can touch I/O.
        // * The lookup is awaited before this record's disposition is final;
        // * no speculation past a pending store query.
        match self.coordinator.check(&record, state, &self.store).await {
            Ok(DedupDecision::Unique) => {
                result.accepted.push(AcceptedRecord { record, quality });
            }
            Ok(DedupDecision::Duplicate { kind, reason }) => {
                match kind {
                    DuplicateKind::Url => result.stats.duplicate_url_count += 1,
                    DuplicateKind::Content => result.stats.duplicate_content_count += 1,
                    DuplicateKind::StoreUrl | DuplicateKind::StoreContent => {
                        result.stats.duplicate_store_count += 1
                    }
                }
                result.rejected.push(RejectedRecord {
                    record: raw,
                    reason: RejectionReason::Duplicate {
                        kind,
                        detail: reason,
                    },
                });
            }
            Err(error) => {
                // * Graceful degradation: reject this record, keep the batch
                // * going. Correctness favors a false rejection over risking
                // * a duplicate in storage.
                result.stats.store_error_count += 1;
                tracing::error!(url = %record.url, error = %error, "Store lookup failed");
                result.rejected.push(RejectedRecord {
                    record: raw,
                    reason: RejectionReason::Store {
                        detail: error.to_string(),
                    },
                });
            }
        }
    }
}
