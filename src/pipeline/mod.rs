pub mod dedupe;
pub mod entities;
pub mod restructure;
pub mod sanitize;
pub mod text;
pub mod timestamp;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::storage::Storage;

/// Outcome of one pipeline run, reported to the caller as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    /// Raw messages flipped to processed, duplicates included.
    pub processed_count: usize,
    /// Canonical messages actually inserted.
    pub canonical_count: usize,
}

/// Drives one normalization run over the full pending batch.
pub struct Processor {
    storage: Arc<dyn Storage>,
}

impl Processor {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Fetch every unprocessed raw message, run the cleaning stages in their
    /// fixed order, then persist canonical rows and flip the processed flags
    /// in a single unit of work. A duplicate raw message is still marked
    /// processed; it just does not get its own canonical row.
    ///
    /// Safe to re-run: processed rows are excluded from the next batch at the
    /// selection boundary, and canonical inserts ignore id conflicts.
    #[instrument(skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn process_pending_batch(&self) -> Result<ProcessSummary> {
        let batch = self.storage.fetch_unprocessed().await?;
        if batch.is_empty() {
            info!("No pending raw messages; nothing to process");
            return Ok(ProcessSummary::default());
        }

        let raw_ids: Vec<i64> = batch.iter().map(|m| m.message_id).collect();
        info!("Processing batch of {} raw messages", batch.len());

        let cleaned = text::clean_batch(&batch);
        let extracted = entities::extract_batch(cleaned);
        let mut surviving = dedupe::dedupe(extracted);
        let malformed = timestamp::normalize_batch(&mut surviving);
        if malformed > 0 {
            warn!("{malformed} rows kept a non-canonical timestamp");
        }
        sanitize::sanitize_batch(&mut surviving);
        let canonical = restructure::restructure_batch(surviving);

        let inserted = self.storage.commit_batch(&canonical, &raw_ids).await?;
        info!(
            processed = raw_ids.len(),
            canonical = inserted,
            "Batch committed"
        );

        Ok(ProcessSummary {
            processed_count: raw_ids.len(),
            canonical_count: inserted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LinkField, RawMessage};
    use crate::storage::InMemoryStorage;

    fn raw(message_id: i64, text: &str, timestamp: &str) -> RawMessage {
        RawMessage {
            message_id,
            channel_name: "Health Channel".to_string(),
            sender: "No sender".to_string(),
            timestamp: timestamp.to_string(),
            message: text.to_string(),
            media: "No media".to_string(),
            is_processed: false,
        }
    }

    #[tokio::test]
    async fn duplicates_collapse_but_all_raw_rows_are_marked_processed() {
        let storage = Arc::new(InMemoryStorage::new());
        storage
            .insert_raw_messages(&[
                raw(1, "buy now 🔥 www.example.com", "2024-05-26 16:11:43+00:00"),
                raw(2, "buy now 🔥 www.example.com", "2024-05-26 16:11:43+00:00"),
                raw(3, "different message", "2024-05-26 16:11:43+00:00"),
            ])
            .await
            .unwrap();

        let summary = Processor::new(storage.clone())
            .process_pending_batch()
            .await
            .unwrap();

        assert_eq!(summary.processed_count, 3);
        assert_eq!(summary.canonical_count, 2);

        // Nothing left pending, and every raw row is flagged.
        assert!(storage.fetch_unprocessed().await.unwrap().is_empty());

        let messages = storage.get_messages(10, None).await.unwrap();
        assert_eq!(messages.len(), 2);
        let first = &messages[0];
        assert_eq!(first.message_id, 1);
        assert_eq!(first.emoji, "🔥");
        assert_eq!(first.message_date, "2024-05-26 16:11:43");
        assert_eq!(
            first.website,
            LinkField::Links(vec!["www.example.com".to_string()])
        );
        assert_eq!(
            first.youtube,
            LinkField::Sentinel("no youtube".to_string())
        );
        assert!(first.phone.is_empty());
    }

    #[tokio::test]
    async fn malformed_timestamp_row_still_produces_a_canonical_row() {
        let storage = Arc::new(InMemoryStorage::new());
        storage
            .insert_raw_messages(&[
                raw(1, "good row", "2024-05-26 16:11:43+00:00"),
                raw(2, "bad clock", "yesterday-ish"),
            ])
            .await
            .unwrap();

        let summary = Processor::new(storage.clone())
            .process_pending_batch()
            .await
            .unwrap();

        assert_eq!(summary.processed_count, 2);
        assert_eq!(summary.canonical_count, 2);

        let messages = storage.get_messages(10, None).await.unwrap();
        let bad = messages.iter().find(|m| m.message_id == 2).unwrap();
        assert_eq!(bad.message_date, "yesterday-ish");
    }

    #[tokio::test]
    async fn empty_batch_is_a_zero_count_no_op() {
        let storage = Arc::new(InMemoryStorage::new());
        let summary = Processor::new(storage)
            .process_pending_batch()
            .await
            .unwrap();
        assert_eq!(summary, ProcessSummary::default());
    }

    #[tokio::test]
    async fn rerunning_after_success_processes_nothing_new() {
        let storage = Arc::new(InMemoryStorage::new());
        storage
            .insert_raw_messages(&[raw(1, "only row", "2024-05-26 16:11:43+00:00")])
            .await
            .unwrap();

        let processor = Processor::new(storage.clone());
        let first = processor.process_pending_batch().await.unwrap();
        assert_eq!(first.processed_count, 1);

        let second = processor.process_pending_batch().await.unwrap();
        assert_eq!(second, ProcessSummary::default());
        assert_eq!(storage.get_messages(10, None).await.unwrap().len(), 1);
    }
}
