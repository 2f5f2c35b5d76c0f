// * Quality Scorer: weighted completeness rubric over normalized records
// * Deterministic - the same record and clock always produce the same
// * assessment, so scores are reproducible across reruns.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::constants::{
    MAX_TAG_COUNT, QUALITY_CONTENT_MAX_CHARS, QUALITY_CONTENT_MIN_CHARS, QUALITY_MIN_WORD_COUNT,
    QUALITY_TITLE_MAX_CHARS, QUALITY_TITLE_MIN_CHARS, READING_TIME_MAX_MINUTES,
    READING_TIME_MIN_MINUTES, READING_WORDS_PER_MINUTE,
};
use crate::config::PipelineConfig;
use crate::persistence::schema::{current_timestamp, NormalizedRecord};

// * Rubric weights - sum to 100
const POINTS_REQUIRED_FIELDS: u8 = 20;
const POINTS_TITLE_LENGTH: u8 = 10;
const POINTS_TITLE_CASE_BONUS: u8 = 5;
const POINTS_CONTENT_LENGTH: u8 = 15;
const POINTS_WORD_COUNT: u8 = 10;
const POINTS_READING_TIME: u8 = 10;
const POINTS_METADATA: u8 = 15;
const POINTS_RECENCY_FULL: u8 = 10;
const POINTS_RECENCY_HALF: u8 = 5;
const POINTS_TAGS: u8 = 5;

// * Number of optional metadata fields in the completeness check
const METADATA_FIELD_COUNT: u8 = 4;

/// Letter grade derived from the quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub enum Grade {
    F,
    D,
    C,
    B,
    A,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

/// Quality verdict for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Weighted completeness score, 0-100
    pub score: u8,
    /// Letter classification of the score
    pub grade: Grade,
    /// One entry per rubric rule that did not score full points, in rule order
    pub issues: Vec<String>,
}

impl QualityAssessment {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Applies the quality rubric.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    max_record_age_secs: u64,
}

impl QualityScorer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            max_record_age_secs: config.max_record_age_secs,
        }
    }

    /// Assesses a record against the current clock
    pub fn assess(&self, record: &NormalizedRecord) -> QualityAssessment {
        self.assess_at(record, current_timestamp())
    }

    // * The assessment clock is injected so recency scoring is testable
    pub fn assess_at(&self, record: &NormalizedRecord, now: u64) -> QualityAssessment {
        let mut score: u8 = 0;
        let mut issues = Vec::new();

        let word_count = record.word_count();

        // * Rule 1: required fields (title, content, url, crawled_at) - all or nothing
        let has_required = !record.title.is_empty()
            && record.content.as_deref().is_some_and(|c| !c.is_empty())
            && !record.url.is_empty()
            && record.crawled_at > 0;
        if has_required {
            score += POINTS_REQUIRED_FIELDS;
        } else {
            issues.push("one or more required fields are missing".to_string());
        }

        // * Rule 2: title length, with a bonus for title-cased headlines
        let title_chars = record.title.chars().count();
        if (QUALITY_TITLE_MIN_CHARS..=QUALITY_TITLE_MAX_CHARS).contains(&title_chars) {
            score += POINTS_TITLE_LENGTH;
            if is_title_cased(&record.title) {
                score += POINTS_TITLE_CASE_BONUS;
            } else {
                issues.push("title is not title-cased".to_string());
            }
        } else {
            issues.push(format!(
                "title length {title_chars} outside [{QUALITY_TITLE_MIN_CHARS}, {QUALITY_TITLE_MAX_CHARS}]"
            ));
        }

        // * Rule 3: content length and substance
        let content_chars = record
            .content
            .as_deref()
            .map(|c| c.chars().count())
            .unwrap_or(0);
        if (QUALITY_CONTENT_MIN_CHARS..=QUALITY_CONTENT_MAX_CHARS).contains(&content_chars) {
            score += POINTS_CONTENT_LENGTH;
        } else {
            issues.push(format!(
                "content length {content_chars} outside [{QUALITY_CONTENT_MIN_CHARS}, {QUALITY_CONTENT_MAX_CHARS}]"
            ));
        }
        if word_count >= QUALITY_MIN_WORD_COUNT {
            score += POINTS_WORD_COUNT;
        } else {
            issues.push(format!(
                "word count {word_count} below {QUALITY_MIN_WORD_COUNT}"
            ));
        }

        // * Rule 4: reading time estimate
        let reading_minutes = word_count as f64 / READING_WORDS_PER_MINUTE as f64;
        if (READING_TIME_MIN_MINUTES..=READING_TIME_MAX_MINUTES).contains(&reading_minutes) {
            score += POINTS_READING_TIME;
        } else {
            issues.push(format!(
                "estimated reading time {reading_minutes:.1} min outside [{READING_TIME_MIN_MINUTES}, {READING_TIME_MAX_MINUTES}]"
            ));
        }

        // * Rule 5: metadata completeness, proportional to fields present
        let metadata_present = [
            record.author.as_deref().is_some_and(|a| !a.is_empty()),
            record.published_at.is_some(),
            !record.tags.is_empty(),
            record.summary.as_deref().is_some_and(|s| !s.is_empty()),
        ]
        .iter()
        .filter(|&&present| present)
        .count() as u8;
        score += metadata_present * POINTS_METADATA / METADATA_FIELD_COUNT;
        if metadata_present < METADATA_FIELD_COUNT {
            issues.push(format!(
                "metadata incomplete: {metadata_present} of {METADATA_FIELD_COUNT} optional fields present"
            ));
        }

        // * Rule 6: publication recency; crawl time stands in when the page
        // * never declared a publication date
        let reference = record.published_at.unwrap_or(record.crawled_at);
        let age = now.saturating_sub(reference);
        if age <= self.max_record_age_secs {
            score += POINTS_RECENCY_FULL;
        } else if age <= 2 * self.max_record_age_secs {
            score += POINTS_RECENCY_HALF;
            issues.push("publication date beyond the freshness window".to_string());
        } else {
            issues.push("publication date far beyond the freshness window".to_string());
        }

        // * Rule 7: tag presence
        if (1..=MAX_TAG_COUNT).contains(&record.tags.len()) {
            score += POINTS_TAGS;
        } else {
            issues.push("no usable tags".to_string());
        }

        QualityAssessment {
            score,
            grade: Grade::from_score(score),
            issues,
        }
    }
}

// * A headline counts as title-cased when every alphabetic word leads with
// * an uppercase letter ("Valid Title Here", not "valid title here")
fn is_title_cased(title: &str) -> bool {
    let mut saw_word = false;
    for word in title.unicode_words() {
        if let Some(first) = word.chars().next() {
            if first.is_alphabetic() {
                saw_word = true;
                if !first.is_uppercase() {
                    return false;
                }
            }
        }
    }
    saw_word
}
