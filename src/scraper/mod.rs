mod metadata;
mod telegram;

pub use metadata::FetchMetadata;
pub use telegram::TelegramPreviewClient;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::domain::{RawMessage, ScrapedMessage};
use crate::error::Result;
use crate::storage::Storage;

/// Core trait for channel message sources.
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Unique identifier for this client, used in logs.
    fn client_name(&self) -> &'static str;

    /// Fetch up to `limit` messages from `channel` with an id greater than
    /// `min_id`.
    async fn fetch_messages(
        &self,
        channel: &str,
        limit: usize,
        min_id: Option<i64>,
    ) -> Result<Vec<ScrapedMessage>>;
}

/// Walks the configured channels, inserts new raw messages, and advances the
/// per-channel fetch cursors.
pub struct Fetcher {
    client: Box<dyn ChannelClient>,
    storage: Arc<dyn Storage>,
}

impl Fetcher {
    pub fn new(client: Box<dyn ChannelClient>, storage: Arc<dyn Storage>) -> Self {
        Self { client, storage }
    }

    /// One fetch pass over `channels`. A failure on one channel is logged and
    /// does not abort the others. Returns the number of raw rows inserted.
    #[instrument(skip(self, channels, metadata_path))]
    pub async fn fetch_channels(
        &self,
        channels: &[String],
        limit: usize,
        metadata_path: &Path,
    ) -> Result<usize> {
        let mut metadata = FetchMetadata::load(metadata_path)?;
        let mut total = 0;

        for channel in channels {
            info!("Fetching messages from {channel}...");
            let min_id = metadata.last_fetched_id(channel);

            match self.client.fetch_messages(channel, limit, min_id).await {
                Ok(messages) if !messages.is_empty() => {
                    let newest = messages
                        .iter()
                        .max_by_key(|m| m.id)
                        .map(|m| (m.id, m.timestamp.clone()));

                    let raw: Vec<RawMessage> =
                        messages.into_iter().map(RawMessage::from_scraped).collect();
                    let inserted = self.storage.insert_raw_messages(&raw).await?;
                    total += inserted;

                    if let Some((id, time)) = newest {
                        metadata.record_fetch(channel, id, time);
                    }
                    info!("Inserted {inserted} new raw messages from {channel}");
                }
                Ok(_) => {
                    info!("No new messages found for {channel}");
                }
                Err(e) => {
                    error!("Error while fetching data from {channel}: {e}");
                }
            }
        }

        metadata.save(metadata_path)?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use tempfile::tempdir;

    struct StubClient {
        messages: Vec<ScrapedMessage>,
    }

    #[async_trait]
    impl ChannelClient for StubClient {
        fn client_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_messages(
            &self,
            channel: &str,
            _limit: usize,
            min_id: Option<i64>,
        ) -> Result<Vec<ScrapedMessage>> {
            if channel == "@broken" {
                return Err(crate::error::PipelineError::Config(
                    "channel unavailable".to_string(),
                ));
            }
            let floor = min_id.unwrap_or(0);
            Ok(self
                .messages
                .iter()
                .filter(|m| m.id > floor)
                .cloned()
                .collect())
        }
    }

    fn scraped(id: i64) -> ScrapedMessage {
        ScrapedMessage {
            id,
            channel_name: Some("Health Channel".to_string()),
            sender: None,
            timestamp: Some("2024-05-26 16:11:43+00:00".to_string()),
            text: Some(format!("message {id}")),
            media: None,
        }
    }

    #[tokio::test]
    async fn fetch_advances_cursor_and_skips_seen_messages() {
        let dir = tempdir().unwrap();
        let meta_path = dir.path().join("channels_metadata.json");
        let storage = Arc::new(InMemoryStorage::new());
        let fetcher = Fetcher::new(
            Box::new(StubClient {
                messages: vec![scraped(1), scraped(2)],
            }),
            storage.clone(),
        );
        let channels = vec!["@health".to_string()];

        let inserted = fetcher
            .fetch_channels(&channels, 200, &meta_path)
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        // Second pass: cursor at 2, nothing new.
        let inserted = fetcher
            .fetch_channels(&channels, 200, &meta_path)
            .await
            .unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(storage.fetch_unprocessed().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn one_broken_channel_does_not_abort_the_rest() {
        let dir = tempdir().unwrap();
        let meta_path = dir.path().join("channels_metadata.json");
        let storage = Arc::new(InMemoryStorage::new());
        let fetcher = Fetcher::new(
            Box::new(StubClient {
                messages: vec![scraped(1)],
            }),
            storage.clone(),
        );
        let channels = vec!["@broken".to_string(), "@health".to_string()];

        let inserted = fetcher
            .fetch_channels(&channels, 200, &meta_path)
            .await
            .unwrap();
        assert_eq!(inserted, 1);
    }
}
