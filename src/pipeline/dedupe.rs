use std::collections::HashSet;

use tracing::info;

use crate::domain::{ExtractedRow, LinkField};

/// Equality key over every non-identity column. The list-valued cells take
/// part via their owned, fixed-order representation, which is hashable.
type ContentKey = (
    String,
    String,
    String,
    String,
    String,
    String,
    LinkField,
    LinkField,
    Vec<String>,
);

fn content_key(row: &ExtractedRow) -> ContentKey {
    (
        row.channel_name.clone(),
        row.sender.clone(),
        row.timestamp.clone(),
        row.message.clone(),
        row.emoji.clone(),
        row.media.clone(),
        row.youtube.clone(),
        row.website.clone(),
        row.phone.clone(),
    )
}

/// Drop rows whose non-identity columns exactly repeat an earlier row.
/// Stable: the first occurrence wins and batch order is preserved.
pub fn dedupe(rows: Vec<ExtractedRow>) -> Vec<ExtractedRow> {
    let before = rows.len();
    let mut seen: HashSet<ContentKey> = HashSet::with_capacity(rows.len());
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        if seen.insert(content_key(&row)) {
            out.push(row);
        }
    }

    if out.len() < before {
        info!(
            "Removed duplicates. Rows before: {}, rows after: {}",
            before,
            out.len()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(message_id: i64, message: &str) -> ExtractedRow {
        ExtractedRow {
            message_id,
            channel_name: "chan".to_string(),
            sender: "No sender".to_string(),
            timestamp: "2024-05-26 16:11:43".to_string(),
            message: message.to_string(),
            emoji: "no emoji".to_string(),
            media: "No media".to_string(),
            youtube: LinkField::Sentinel("no youtube".to_string()),
            website: LinkField::Sentinel("no website".to_string()),
            phone: Vec::new(),
        }
    }

    #[test]
    fn duplicate_content_is_dropped_keeping_first() {
        let rows = vec![row(1, "hello"), row(2, "hello"), row(3, "other")];
        let out = dedupe(rows);
        assert_eq!(
            out.iter().map(|r| r.message_id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn list_valued_columns_participate_in_the_key() {
        let mut a = row(1, "call 0911234567");
        a.phone = vec!["0911234567".to_string()];
        let mut b = row(2, "call 0911234567");
        b.phone = vec!["0911234567".to_string()];
        let mut c = row(3, "call 0911234567");
        c.phone = vec!["0911234567".to_string(), "8100".to_string()];

        let out = dedupe(vec![a, b, c]);
        assert_eq!(
            out.iter().map(|r| r.message_id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn dedupe_is_idempotent() {
        let rows = vec![row(1, "a"), row(2, "a"), row(3, "b")];
        let once = dedupe(rows);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
    }
}
