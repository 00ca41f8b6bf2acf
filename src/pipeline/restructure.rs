use crate::domain::{CanonicalMessage, ExtractedRow};

/// Pure field renaming to the canonical schema: channel_name -> channel_title,
/// timestamp -> message_date, media -> media_path. The message text field
/// keeps its name; no value is transformed. The sender column is not part of
/// the canonical schema and is dropped here.
pub fn restructure(row: ExtractedRow) -> CanonicalMessage {
    CanonicalMessage {
        message_id: row.message_id,
        channel_title: row.channel_name,
        message: row.message,
        message_date: row.timestamp,
        media_path: row.media,
        emoji: row.emoji,
        youtube: row.youtube,
        website: row.website,
        phone: row.phone,
    }
}

pub fn restructure_batch(rows: Vec<ExtractedRow>) -> Vec<CanonicalMessage> {
    rows.into_iter().map(restructure).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LinkField;

    #[test]
    fn fields_are_renamed_without_value_changes() {
        let canonical = restructure(ExtractedRow {
            message_id: 7,
            channel_name: "Health Channel".to_string(),
            sender: "No sender".to_string(),
            timestamp: "2024-05-26 16:11:43".to_string(),
            message: "hello".to_string(),
            emoji: "no emoji".to_string(),
            media: "downloads/photo_7.jpg".to_string(),
            youtube: LinkField::Sentinel("no youtube".to_string()),
            website: LinkField::Sentinel("no website".to_string()),
            phone: vec!["0911234567".to_string()],
        });

        assert_eq!(canonical.message_id, 7);
        assert_eq!(canonical.channel_title, "Health Channel");
        assert_eq!(canonical.message, "hello");
        assert_eq!(canonical.message_date, "2024-05-26 16:11:43");
        assert_eq!(canonical.media_path, "downloads/photo_7.jpg");
        assert_eq!(canonical.phone, vec!["0911234567".to_string()]);
    }
}
