mod memory;
mod sqlite;

pub use memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;

use crate::domain::{CanonicalMessage, RawMessage};
use crate::error::Result;

/// Persistence boundary for the raw and canonical message tables.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert scraped messages, skipping message ids already present.
    /// Returns how many rows were actually inserted.
    async fn insert_raw_messages(&self, messages: &[RawMessage]) -> Result<usize>;

    /// All raw messages with `is_processed = false`, in insertion order.
    async fn fetch_unprocessed(&self) -> Result<Vec<RawMessage>>;

    /// Persist canonical rows and mark `raw_ids` processed as one unit of
    /// work: either everything commits or nothing does. Canonical inserts
    /// ignore message-id conflicts (a second writer means the row is already
    /// handled, not an error). Returns the number of canonical rows actually
    /// inserted.
    async fn commit_batch(&self, canonical: &[CanonicalMessage], raw_ids: &[i64])
        -> Result<usize>;

    /// Canonical messages for the API layer, optionally filtered by a
    /// case-insensitive channel title substring.
    async fn get_messages(
        &self,
        limit: usize,
        channel_title: Option<&str>,
    ) -> Result<Vec<CanonicalMessage>>;

    /// Unprocessed raw messages for the API layer.
    async fn get_raw_messages(&self, limit: usize) -> Result<Vec<RawMessage>>;

    /// User-initiated edit of a canonical message's text. Returns false when
    /// the id is unknown.
    async fn update_message_text(&self, message_id: i64, text: &str) -> Result<bool>;

    /// Delete a canonical message. Returns false when the id is unknown.
    async fn delete_message(&self, message_id: i64) -> Result<bool>;
}
