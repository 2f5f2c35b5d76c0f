// * Pipeline configuration with construction-time validation
// * Invalid thresholds are the only fatal error in this crate: they are
// * rejected at pipeline construction, before any record is processed.

pub mod constants;

use constants::{
    DEFAULT_LENGTH_RATIO_CUTOFF, DEFAULT_MAX_FUTURE_SKEW_SECS, DEFAULT_MAX_RECORD_AGE_SECS,
    DEFAULT_MIN_QUALITY_SCORE, DEFAULT_SEQUENCE_WEIGHT, DEFAULT_SIMILARITY_THRESHOLD,
    DEFAULT_TOKEN_WEIGHT,
};
use thiserror::Error;

// * Tolerance when checking that the similarity weights sum to 1.0
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Similarity threshold {0} outside [0.0, 1.0]")]
    InvalidSimilarityThreshold(f64),

    #[error("Minimum quality score {0} exceeds 100")]
    InvalidMinQualityScore(u8),

    #[error("Length ratio cutoff {0} outside [0.0, 1.0]")]
    InvalidLengthRatioCutoff(f64),

    #[error("Similarity weights ({sequence}, {token}) must be non-negative and sum to 1.0")]
    InvalidSimilarityWeights { sequence: f64, token: f64 },
}

/// Tunable thresholds for one pipeline instance.
///
/// Defaults match `config::constants`; hosts override individual fields and
/// hand the config to `BatchProcessor::new`, which calls [`validate`].
///
/// [`validate`]: PipelineConfig::validate
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Content similarity at or above which a record is a near-duplicate
    pub similarity_threshold: f64,
    /// Minimum quality score (0-100) to proceed to deduplication
    pub min_quality_score: u8,
    /// Maximum accepted age of a publication timestamp, in seconds
    pub max_record_age_secs: u64,
    /// Maximum tolerated future clock skew for publication timestamps, in seconds
    pub max_future_skew_secs: u64,
    /// Length pre-filter ratio for the similarity scorer
    pub length_ratio_cutoff: f64,
    /// Weight of the character-level sequence ratio in the combined score
    pub sequence_weight: f64,
    /// Weight of the token cosine similarity in the combined score
    pub token_weight: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_quality_score: DEFAULT_MIN_QUALITY_SCORE,
            max_record_age_secs: DEFAULT_MAX_RECORD_AGE_SECS,
            max_future_skew_secs: DEFAULT_MAX_FUTURE_SKEW_SECS,
            length_ratio_cutoff: DEFAULT_LENGTH_RATIO_CUTOFF,
            sequence_weight: DEFAULT_SEQUENCE_WEIGHT,
            token_weight: DEFAULT_TOKEN_WEIGHT,
        }
    }
}

impl PipelineConfig {
    /// Checks every threshold; the first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) || self.similarity_threshold.is_nan() {
            return Err(ConfigError::InvalidSimilarityThreshold(
                self.similarity_threshold,
            ));
        }

        if self.min_quality_score > 100 {
            return Err(ConfigError::InvalidMinQualityScore(self.min_quality_score));
        }

        if !(0.0..=1.0).contains(&self.length_ratio_cutoff) || self.length_ratio_cutoff.is_nan() {
            return Err(ConfigError::InvalidLengthRatioCutoff(
                self.length_ratio_cutoff,
            ));
        }

        let weight_sum = self.sequence_weight + self.token_weight;
        if self.sequence_weight < 0.0
            || self.token_weight < 0.0
            || (weight_sum - 1.0).abs() > WEIGHT_SUM_EPSILON
        {
            return Err(ConfigError::InvalidSimilarityWeights {
                sequence: self.sequence_weight,
                token: self.token_weight,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_similarity_threshold_bounds() {
        let config = PipelineConfig {
            similarity_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSimilarityThreshold(_))
        ));

        let config = PipelineConfig {
            similarity_threshold: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_quality_score_bound() {
        let config = PipelineConfig {
            min_quality_score: 101,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMinQualityScore(101))
        ));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let config = PipelineConfig {
            sequence_weight: 0.8,
            token_weight: 0.3,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSimilarityWeights { .. })
        ));
    }

    #[test]
    fn test_reweighted_similarity_is_accepted() {
        // * Weights are configuration, not physics - any convex pair is fine
        let config = PipelineConfig {
            sequence_weight: 0.5,
            token_weight: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = PipelineConfig {
            sequence_weight: 1.2,
            token_weight: -0.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
