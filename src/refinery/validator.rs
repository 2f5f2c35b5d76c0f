// * Field Validator: schema enforcement and record cleaning
// * Collects every violation instead of failing on the first, so the host
// * gets complete feedback for a bad record in one pass.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::constants::{
    MAX_TAG_COUNT, MAX_TAG_LENGTH, MAX_TITLE_LENGTH, MAX_URL_LENGTH, MIN_CONTENT_LENGTH,
    REPETITION_MAX_RATIO, REPETITION_MIN_WORDS,
};
use crate::config::PipelineConfig;
use crate::engine::{fingerprint, normalization};
use crate::persistence::schema::{current_timestamp, NormalizedRecord, RawRecord};

// * Tags are a controlled vocabulary: alphanumerics, spaces, hyphens, underscores
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s\-_]+$").unwrap());

/// Category of a field validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    #[error("missing")]
    Missing,
    #[error("malformed")]
    Malformed,
    #[error("too_short")]
    TooShort,
    #[error("too_long")]
    TooLong,
    #[error("out_of_range")]
    OutOfRange,
    #[error("repetitive")]
    Repetitive,
}

/// A single validation failure on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.kind, self.message)
    }
}

/// Validates raw records against the schema and produces cleaned,
/// normalized records. Pure over its input, thresholds, and the clock.
#[derive(Debug, Clone)]
pub struct Validator {
    max_record_age_secs: u64,
    max_future_skew_secs: u64,
}

impl Validator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            max_record_age_secs: config.max_record_age_secs,
            max_future_skew_secs: config.max_future_skew_secs,
        }
    }

    /// Validates a record, collecting all violations.
    ///
    /// Hard rules (url, title, content, publication date) reject the whole
    /// record; tags are soft rules and are silently cleaned instead.
    pub fn validate(&self, record: &RawRecord) -> Result<NormalizedRecord, Vec<FieldError>> {
        self.validate_at(record, current_timestamp())
    }

    // * The validation clock is injected so the date-window checks are testable
    pub fn validate_at(
        &self,
        record: &RawRecord,
        now: u64,
    ) -> Result<NormalizedRecord, Vec<FieldError>> {
        let mut errors = Vec::new();

        check_url(&record.url, &mut errors);
        check_title(&record.title, &mut errors);
        if let Some(content) = record.content.as_deref() {
            check_content(content, &mut errors);
        }
        if let Some(published_at) = record.published_at {
            self.check_published_at(published_at, now, &mut errors);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let content = record.content.as_deref().map(collapse_whitespace);
        Ok(NormalizedRecord {
            url: normalization::normalize_url(&record.url),
            url_fingerprint: normalization::url_fingerprint(&record.url),
            title: collapse_whitespace(&record.title),
            content_hash: content.as_deref().map(fingerprint::content_hash),
            content,
            summary: record.summary.clone(),
            author: record.author.clone(),
            published_at: record.published_at,
            tags: clean_tags(&record.tags),
            crawled_at: record.crawled_at,
            source_url: record.source_url.clone(),
        })
    }

    fn check_published_at(&self, published_at: u64, now: u64, errors: &mut Vec<FieldError>) {
        if published_at + self.max_record_age_secs < now {
            errors.push(FieldError::new(
                "published_at",
                FieldErrorKind::OutOfRange,
                format!(
                    "publication date older than the maximum age of {} days",
                    self.max_record_age_secs / 86_400
                ),
            ));
        } else if published_at > now + self.max_future_skew_secs {
            errors.push(FieldError::new(
                "published_at",
                FieldErrorKind::OutOfRange,
                format!(
                    "publication date more than {} days in the future",
                    self.max_future_skew_secs / 86_400
                ),
            ));
        }
    }
}

fn check_url(url: &str, errors: &mut Vec<FieldError>) {
    if url.trim().is_empty() {
        errors.push(FieldError::new(
            "url",
            FieldErrorKind::Missing,
            "url must not be empty",
        ));
        return;
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        errors.push(FieldError::new(
            "url",
            FieldErrorKind::Malformed,
            "url must begin with http:// or https://",
        ));
    }

    if url.chars().count() > MAX_URL_LENGTH {
        errors.push(FieldError::new(
            "url",
            FieldErrorKind::TooLong,
            format!("url exceeds {MAX_URL_LENGTH} characters"),
        ));
    }
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        errors.push(FieldError::new(
            "title",
            FieldErrorKind::Missing,
            "title must not be empty",
        ));
        return;
    }

    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        errors.push(FieldError::new(
            "title",
            FieldErrorKind::TooLong,
            format!("title exceeds {MAX_TITLE_LENGTH} characters"),
        ));
    }
}

fn check_content(content: &str, errors: &mut Vec<FieldError>) {
    if content.chars().count() < MIN_CONTENT_LENGTH {
        errors.push(FieldError::new(
            "content",
            FieldErrorKind::TooShort,
            format!("content shorter than {MIN_CONTENT_LENGTH} characters"),
        ));
        return;
    }

    // * Repetition heuristic: a single token dominating the text is spam
    // * or a broken extraction, not prose
    let words: Vec<String> = content
        .unicode_words()
        .map(|word| word.to_lowercase())
        .collect();
    if words.len() >= REPETITION_MIN_WORDS {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in &words {
            *counts.entry(word.as_str()).or_insert(0) += 1;
        }

        if let Some((top_word, &top_count)) = counts.iter().max_by_key(|(_, &count)| count) {
            let ratio = top_count as f64 / words.len() as f64;
            if ratio > REPETITION_MAX_RATIO {
                errors.push(FieldError::new(
                    "content",
                    FieldErrorKind::Repetitive,
                    format!(
                        "excessive repetition: \"{top_word}\" accounts for {:.0}% of {} words",
                        ratio * 100.0,
                        words.len()
                    ),
                ));
            }
        }
    }
}

// * Soft cleaning, never a rejection: trim, lowercase, drop junk, dedupe
// * preserving first occurrence, cap the count
fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();

    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty()
            || tag.chars().count() > MAX_TAG_LENGTH
            || !TAG_PATTERN.is_match(&tag)
        {
            continue;
        }
        if seen.insert(tag.clone()) {
            cleaned.push(tag);
        }
        if cleaned.len() == MAX_TAG_COUNT {
            break;
        }
    }

    cleaned
}

// * Collapses whitespace runs to single spaces and trims the ends
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}
