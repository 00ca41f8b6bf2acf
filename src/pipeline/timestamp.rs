use chrono::NaiveDateTime;
use tracing::warn;

use crate::domain::ExtractedRow;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonicalize a single timestamp string: strip any suffix starting at the
/// first `+` (dropping, not converting, the UTC offset), parse under the
/// fixed format, re-render in the same format. `None` when the remainder
/// does not fit the format.
pub fn normalize_value(value: &str) -> Option<String> {
    let bare = value.split('+').next().unwrap_or(value);
    NaiveDateTime::parse_from_str(bare, TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Rewrite each row's timestamp in the canonical format. A malformed value is
/// reported and left as-is; it never fails the batch. Returns how many rows
/// kept their original value.
pub fn normalize_batch(rows: &mut [ExtractedRow]) -> usize {
    let mut malformed = 0;
    for row in rows.iter_mut() {
        match normalize_value(&row.timestamp) {
            Some(canonical) => row.timestamp = canonical,
            None => {
                malformed += 1;
                warn!(
                    message_id = row.message_id,
                    value = %row.timestamp,
                    "timestamp does not match canonical format; keeping original value"
                );
            }
        }
    }
    malformed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LinkField;

    #[test]
    fn utc_offset_suffix_is_stripped() {
        assert_eq!(
            normalize_value("2024-05-26 16:11:43+00:00").as_deref(),
            Some("2024-05-26 16:11:43")
        );
    }

    #[test]
    fn canonical_values_pass_through_unchanged() {
        assert_eq!(
            normalize_value("2023-12-18 17:04:02").as_deref(),
            Some("2023-12-18 17:04:02")
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert_eq!(normalize_value("No timestamp"), None);
        assert_eq!(normalize_value("2024-05-26T16:11:43+00:00"), None);
        assert_eq!(normalize_value(""), None);
    }

    #[test]
    fn malformed_row_keeps_original_value_and_is_counted() {
        let mut rows = vec![
            ExtractedRow {
                message_id: 1,
                channel_name: "chan".to_string(),
                sender: "s".to_string(),
                timestamp: "2024-05-26 16:11:43+00:00".to_string(),
                message: "a".to_string(),
                emoji: "no emoji".to_string(),
                media: "No media".to_string(),
                youtube: LinkField::Sentinel("no youtube".to_string()),
                website: LinkField::Sentinel("no website".to_string()),
                phone: Vec::new(),
            },
            ExtractedRow {
                message_id: 2,
                channel_name: "chan".to_string(),
                sender: "s".to_string(),
                timestamp: "not a timestamp".to_string(),
                message: "b".to_string(),
                emoji: "no emoji".to_string(),
                media: "No media".to_string(),
                youtube: LinkField::Sentinel("no youtube".to_string()),
                website: LinkField::Sentinel("no website".to_string()),
                phone: Vec::new(),
            },
        ];

        let malformed = normalize_batch(&mut rows);
        assert_eq!(malformed, 1);
        assert_eq!(rows[0].timestamp, "2024-05-26 16:11:43");
        assert_eq!(rows[1].timestamp, "not a timestamp");
    }
}
