use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{CleanedRow, RawMessage};

pub const NO_EMOJI: &str = "no emoji";

/// Pictographs, skin-tone modifiers, flag components, and the joiner
/// characters that stitch emoji sequences together. Keycap digits are
/// deliberately excluded so plain ASCII text never classifies as emoji.
static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\u{1F1E6}-\u{1F1FF}\u{200D}\u{FE0F}\u{20E3}]")
        .unwrap()
});

fn is_emoji_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    EMOJI.is_match(c.encode_utf8(&mut buf))
}

/// Collapse embedded line breaks to single spaces, trim, and partition the
/// characters into cleaned text and an emoji string. Pure transform; every
/// later stage assumes text has been through here.
pub fn clean(raw: &RawMessage) -> CleanedRow {
    let flattened = raw.message.replace('\n', " ");
    let trimmed = flattened.trim();

    let mut message = String::with_capacity(trimmed.len());
    let mut emoji = String::new();
    for c in trimmed.chars() {
        if is_emoji_char(c) {
            emoji.push(c);
        } else {
            message.push(c);
        }
    }

    let emoji = if emoji.is_empty() {
        NO_EMOJI.to_string()
    } else {
        emoji
    };

    CleanedRow {
        message_id: raw.message_id,
        channel_name: raw.channel_name.clone(),
        sender: raw.sender.clone(),
        timestamp: raw.timestamp.clone(),
        message,
        emoji,
        media: raw.media.clone(),
    }
}

pub fn clean_batch(batch: &[RawMessage]) -> Vec<CleanedRow> {
    batch.iter().map(clean).collect()
}
