use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{CanonicalMessage, RawMessage};
use crate::error::Result;
use crate::storage::Storage;

#[derive(Default)]
struct Inner {
    raw: Vec<RawMessage>,
    canonical: Vec<CanonicalMessage>,
}

/// In-memory storage implementation for development/testing.
///
/// A single mutex over both tables stands in for the database transaction:
/// `commit_batch` holds it for the whole unit of work.
#[derive(Default)]
pub struct InMemoryStorage {
    inner: Mutex<Inner>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_raw_messages(&self, messages: &[RawMessage]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let mut inserted = 0;
        for msg in messages {
            if inner.raw.iter().any(|m| m.message_id == msg.message_id) {
                continue;
            }
            inner.raw.push(msg.clone());
            inserted += 1;
        }
        debug!("Inserted {} raw messages", inserted);
        Ok(inserted)
    }

    async fn fetch_unprocessed(&self) -> Result<Vec<RawMessage>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .raw
            .iter()
            .filter(|m| !m.is_processed)
            .cloned()
            .collect())
    }

    async fn commit_batch(
        &self,
        canonical: &[CanonicalMessage],
        raw_ids: &[i64],
    ) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();

        let mut inserted = 0;
        for msg in canonical {
            if inner
                .canonical
                .iter()
                .any(|m| m.message_id == msg.message_id)
            {
                continue;
            }
            inner.canonical.push(msg.clone());
            inserted += 1;
        }

        for msg in inner.raw.iter_mut() {
            if raw_ids.contains(&msg.message_id) {
                msg.is_processed = true;
            }
        }

        debug!(
            "Committed batch: {} canonical rows, {} raw rows marked processed",
            inserted,
            raw_ids.len()
        );
        Ok(inserted)
    }

    async fn get_messages(
        &self,
        limit: usize,
        channel_title: Option<&str>,
    ) -> Result<Vec<CanonicalMessage>> {
        let inner = self.inner.lock().unwrap();
        let filter = channel_title.map(|c| c.to_lowercase());
        Ok(inner
            .canonical
            .iter()
            .filter(|m| match &filter {
                Some(needle) => m.channel_title.to_lowercase().contains(needle),
                None => true,
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_raw_messages(&self, limit: usize) -> Result<Vec<RawMessage>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .raw
            .iter()
            .filter(|m| !m.is_processed)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_message_text(&self, message_id: i64, text: &str) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .canonical
            .iter_mut()
            .find(|m| m.message_id == message_id)
        {
            Some(msg) => {
                msg.message = text.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_message(&self, message_id: i64) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.canonical.len();
        inner.canonical.retain(|m| m.message_id != message_id);
        Ok(inner.canonical.len() < before)
    }
}
