use serde::{Deserialize, Serialize};

/// A message as handed over by the channel scraping client, before ingestion
/// defaults are applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedMessage {
    pub id: i64,
    pub channel_name: Option<String>,
    pub sender: Option<String>,
    pub timestamp: Option<String>,
    pub text: Option<String>,
    pub media: Option<String>,
}

/// An unprocessed scraped message as stored in the raw table.
///
/// `is_processed` is flipped false -> true exactly once by the batch
/// processor and never reversed; raw rows are never deleted by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub message_id: i64,
    pub channel_name: String,
    pub sender: String,
    pub timestamp: String,
    pub message: String,
    pub media: String,
    pub is_processed: bool,
}

impl RawMessage {
    /// Ingestion defaults: absent scraped fields are stored as capitalized
    /// placeholders rather than left empty.
    pub fn from_scraped(msg: ScrapedMessage) -> Self {
        fn or_default(value: Option<String>, placeholder: &str) -> String {
            match value {
                Some(v) if !v.is_empty() => v,
                _ => placeholder.to_string(),
            }
        }

        Self {
            message_id: msg.id,
            channel_name: or_default(msg.channel_name, "No channel name"),
            sender: or_default(msg.sender, "No sender"),
            timestamp: or_default(msg.timestamp, "No timestamp"),
            message: or_default(msg.text, "No message"),
            media: or_default(msg.media, "No media"),
            is_processed: false,
        }
    }
}

/// A link column holds either every match found or a string sentinel.
///
/// The asymmetry with the phone column (empty list, never a string) is
/// intentional; downstream consumers depend on the distinction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkField {
    Links(Vec<String>),
    Sentinel(String),
}

impl LinkField {
    /// Wrap extractor output, substituting the `no <column>` sentinel when
    /// nothing matched.
    pub fn from_matches(matches: Vec<String>, column: &str) -> Self {
        if matches.is_empty() {
            LinkField::Sentinel(format!("no {column}"))
        } else {
            LinkField::Links(matches)
        }
    }

    pub fn links(&self) -> &[String] {
        match self {
            LinkField::Links(links) => links,
            LinkField::Sentinel(_) => &[],
        }
    }
}

/// Row after text normalization: line breaks collapsed, emoji partitioned out.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRow {
    pub message_id: i64,
    pub channel_name: String,
    pub sender: String,
    pub timestamp: String,
    pub message: String,
    pub emoji: String,
    pub media: String,
}

/// Row after entity extraction. The timestamp and null-sanitization stages
/// rewrite cells of this type in place; restructuring turns it into a
/// [`CanonicalMessage`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    pub message_id: i64,
    pub channel_name: String,
    pub sender: String,
    pub timestamp: String,
    pub message: String,
    pub emoji: String,
    pub media: String,
    pub youtube: LinkField,
    pub website: LinkField,
    pub phone: Vec<String>,
}

/// The cleaned, entity-enriched, schema-normalized message ready for querying.
///
/// Logically 1:1 with a raw message via `message_id`; created exactly once per
/// raw row and immutable afterwards except for user-initiated text edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMessage {
    pub message_id: i64,
    pub channel_title: String,
    pub message: String,
    pub message_date: String,
    pub media_path: String,
    pub emoji: String,
    pub youtube: LinkField,
    pub website: LinkField,
    pub phone: Vec<String>,
}
