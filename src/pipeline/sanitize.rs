use crate::domain::ExtractedRow;

fn is_null_marker(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan")
}

fn sanitize_cell(value: &mut String, column: &str) {
    if is_null_marker(value) {
        *value = format!("no {column}");
    }
}

/// Replace every missing/empty/"nan" cell with a per-column sentinel.
///
/// Columns still carry their raw names at this point; renaming happens in the
/// restructure step, so the sentinels use raw column names. The link and phone
/// columns already carry their own empty shapes from extraction and are left
/// alone. Idempotent: a cell that is already a sentinel is never rewritten.
pub fn sanitize_batch(rows: &mut [ExtractedRow]) {
    for row in rows.iter_mut() {
        sanitize_cell(&mut row.channel_name, "channel_name");
        sanitize_cell(&mut row.sender, "sender");
        sanitize_cell(&mut row.timestamp, "timestamp");
        sanitize_cell(&mut row.message, "message");
        sanitize_cell(&mut row.emoji, "emoji");
        sanitize_cell(&mut row.media, "media");
    }
}
