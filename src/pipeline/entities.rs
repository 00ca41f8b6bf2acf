use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{CleanedRow, ExtractedRow, LinkField};

static YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"https?://(?:www\.)?youtube(?:-nocookie)?\.com/(?:[^ \n]+)?|https?://youtu\.be/[\w\-]+",
    )
    .unwrap()
});

static WEBSITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s]+|www\.[^\s]+").unwrap());

/// Regional phone forms. Alternation order decides which form wins when more
/// than one could match at the same position.
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+251\d{9}|09\d{8}|07\d{8}|\b\d{4}\b").unwrap());

fn find_all(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub fn extract_youtube(text: &str) -> LinkField {
    LinkField::from_matches(find_all(&YOUTUBE, text), "youtube")
}

pub fn extract_website(text: &str) -> LinkField {
    LinkField::from_matches(find_all(&WEBSITE, text), "website")
}

pub fn extract_phones(text: &str) -> Vec<String> {
    find_all(&PHONE, text)
}

/// Run every extractor over the same normalized text. Extractors are
/// independent; none of them reads another's output.
pub fn extract(row: CleanedRow) -> ExtractedRow {
    let youtube = extract_youtube(&row.message);
    let website = extract_website(&row.message);
    let phone = extract_phones(&row.message);

    ExtractedRow {
        message_id: row.message_id,
        channel_name: row.channel_name,
        sender: row.sender,
        timestamp: row.timestamp,
        message: row.message,
        emoji: row.emoji,
        media: row.media,
        youtube,
        website,
        phone,
    }
}

pub fn extract_batch(rows: Vec<CleanedRow>) -> Vec<ExtractedRow> {
    rows.into_iter().map(extract).collect()
}
