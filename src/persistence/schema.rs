// * Record Schema for the Refinement Pipeline
// * RawRecord is what a crawl session hands over; NormalizedRecord is what
// * the pipeline accepts and the host persists.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use unicode_segmentation::UnicodeSegmentation;

/// Input unit from a crawl session.
///
/// # Fields
/// - `url`: as fetched, not yet canonicalized
/// - `title`: extracted page title
/// - `content`: extracted main text, when extraction found any
/// - `published_at` / `crawled_at`: Unix seconds
/// - `tags`: as extracted - duplicates and junk allowed, the validator cleans them
/// - `source_url`: the page the record was discovered from
///
/// Immutable once handed to the pipeline; consumed exactly once per run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<u64>,
    pub tags: Vec<String>,
    pub crawled_at: u64,
    pub source_url: String,
}

impl RawRecord {
    /// Creates a record with the required fields; the rest default to empty
    pub fn new(url: impl Into<String>, title: impl Into<String>, crawled_at: u64) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            crawled_at,
            ..Default::default()
        }
    }

    /// Creates a record builder for fluent construction.
    /// `crawled_at` defaults to the current clock.
    pub fn builder(url: impl Into<String>, title: impl Into<String>) -> RawRecordBuilder {
        RawRecordBuilder::new(url, title)
    }

    /// Converts to JSON string for logging and transport
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Builder pattern for RawRecord construction
#[derive(Debug, Clone)]
pub struct RawRecordBuilder {
    record: RawRecord,
}

impl RawRecordBuilder {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            record: RawRecord::new(url, title, current_timestamp()),
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.record.content = Some(content.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.record.summary = Some(summary.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.record.author = Some(author.into());
        self
    }

    pub fn published_at(mut self, timestamp: u64) -> Self {
        self.record.published_at = Some(timestamp);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn crawled_at(mut self, timestamp: u64) -> Self {
        self.record.crawled_at = timestamp;
        self
    }

    pub fn source_url(mut self, source_url: impl Into<String>) -> Self {
        self.record.source_url = source_url.into();
        self
    }

    pub fn build(self) -> RawRecord {
        self.record
    }
}

/// A validated, cleaned record.
///
/// Invariant: every NormalizedRecord satisfies the field validator's schema -
/// the only way to obtain one is through `Validator::validate`.
/// `url` is canonical, `url_fingerprint`/`content_hash` are xxh3-128 over the
/// canonical forms, tags are lowercased and deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub url: String,
    pub url_fingerprint: u128,
    pub title: String,
    pub content: Option<String>,
    pub content_hash: Option<u128>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<u64>,
    pub tags: Vec<String>,
    pub crawled_at: u64,
    pub source_url: String,
}

impl NormalizedRecord {
    /// Unicode word count of the content, 0 when content is absent
    pub fn word_count(&self) -> usize {
        self.content
            .as_deref()
            .map(|text| text.unicode_words().count())
            .unwrap_or(0)
    }

    /// Converts to JSON string for logging and transport
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Returns current Unix timestamp in seconds
pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = RawRecord::new("https://example.com/page", "A Page", 1_700_000_000);

        assert_eq!(record.url, "https://example.com/page");
        assert_eq!(record.title, "A Page");
        assert_eq!(record.crawled_at, 1_700_000_000);
        assert!(record.content.is_none());
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_builder_pattern() {
        let record = RawRecord::builder("https://example.com", "Title")
            .content("Body text of the page")
            .author("Jane Doe")
            .published_at(1_700_000_000)
            .tags(["rust", "crawling"])
            .source_url("https://example.com/index")
            .build();

        assert_eq!(record.content.as_deref(), Some("Body text of the page"));
        assert_eq!(record.author.as_deref(), Some("Jane Doe"));
        assert_eq!(record.published_at, Some(1_700_000_000));
        assert_eq!(record.tags.len(), 2);
        assert_eq!(record.source_url, "https://example.com/index");
        assert!(record.crawled_at > 0, "builder should stamp crawled_at");
    }

    #[test]
    fn test_serialization_round_trip() {
        let record = RawRecord::builder("https://example.com", "Title")
            .content("Some content")
            .crawled_at(1_700_000_000)
            .build();

        let json = record.to_json();
        assert!(json.contains("example.com"));

        let parsed: RawRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_word_count() {
        let record = NormalizedRecord {
            url: "https://example.com".to_string(),
            url_fingerprint: 1,
            title: "Title".to_string(),
            content: Some("one two three, four!".to_string()),
            content_hash: Some(2),
            summary: None,
            author: None,
            published_at: None,
            tags: Vec::new(),
            crawled_at: 1_700_000_000,
            source_url: String::new(),
        };

        assert_eq!(record.word_count(), 4);
    }

    #[test]
    fn test_word_count_without_content() {
        let record = NormalizedRecord {
            url: "https://example.com".to_string(),
            url_fingerprint: 1,
            title: "Title".to_string(),
            content: None,
            content_hash: None,
            summary: None,
            author: None,
            published_at: None,
            tags: Vec::new(),
            crawled_at: 1_700_000_000,
            source_url: String::new(),
        };

        assert_eq!(record.word_count(), 0);
    }
}
