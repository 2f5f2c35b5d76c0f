// * Configuration Constants
// * Central location for all configurable thresholds used by the pipeline

// * Content similarity score at or above which two records are near-duplicates
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

// * Minimum quality score (0-100) a record must reach to be considered for storage
pub const DEFAULT_MIN_QUALITY_SCORE: u8 = 60;

// * Maximum accepted age of a publication timestamp (365 days)
pub const DEFAULT_MAX_RECORD_AGE_SECS: u64 = 365 * 24 * 60 * 60;

// * Maximum tolerated clock skew into the future for publication timestamps (30 days)
pub const DEFAULT_MAX_FUTURE_SKEW_SECS: u64 = 30 * 24 * 60 * 60;

// * Length pre-filter: pairs whose normalized lengths differ by more than this
// * ratio score 0.0 without running the similarity metrics
pub const DEFAULT_LENGTH_RATIO_CUTOFF: f64 = 0.5;

// * Weights for the combined similarity score (must sum to 1.0)
pub const DEFAULT_SEQUENCE_WEIGHT: f64 = 0.7;
pub const DEFAULT_TOKEN_WEIGHT: f64 = 0.3;

// * Field validation bounds
pub const MAX_URL_LENGTH: usize = 2000;
pub const MAX_TITLE_LENGTH: usize = 500;
pub const MIN_CONTENT_LENGTH: usize = 10;
pub const MAX_TAG_COUNT: usize = 20;
pub const MAX_TAG_LENGTH: usize = 50;

// * Repetition heuristic: checked once content reaches this many words,
// * rejected when the most frequent token exceeds the ratio
pub const REPETITION_MIN_WORDS: usize = 50;
pub const REPETITION_MAX_RATIO: f64 = 0.3;

// * Quality rubric bounds
pub const QUALITY_TITLE_MIN_CHARS: usize = 10;
pub const QUALITY_TITLE_MAX_CHARS: usize = 200;
pub const QUALITY_CONTENT_MIN_CHARS: usize = 50;
pub const QUALITY_CONTENT_MAX_CHARS: usize = 100_000;
pub const QUALITY_MIN_WORD_COUNT: usize = 100;

// * Reading time estimate bounds (word_count / 200 wpm, in minutes)
pub const READING_WORDS_PER_MINUTE: usize = 200;
pub const READING_TIME_MIN_MINUTES: f64 = 2.0;
pub const READING_TIME_MAX_MINUTES: f64 = 45.0;
