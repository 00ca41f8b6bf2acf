use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Per-channel fetch cursor, persisted between runs so a fetch pass only asks
/// for messages newer than what it has already ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelCursor {
    pub last_fetched_id: i64,
    pub last_fetched_time: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FetchMetadata {
    #[serde(flatten)]
    channels: HashMap<String, ChannelCursor>,
}

impl FetchMetadata {
    /// Load from `path`; a missing file is an empty cursor set, not an error.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn last_fetched_id(&self, channel: &str) -> Option<i64> {
        self.channels.get(channel).map(|c| c.last_fetched_id)
    }

    pub fn record_fetch(&mut self, channel: &str, id: i64, time: Option<String>) {
        self.channels.insert(
            channel.to_string(),
            ChannelCursor {
                last_fetched_id: id,
                last_fetched_time: time,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cursors_round_trip_through_the_metadata_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels_metadata.json");

        let mut metadata = FetchMetadata::load(&path).unwrap();
        assert_eq!(metadata.last_fetched_id("@health"), None);

        metadata.record_fetch("@health", 42, Some("2024-05-26 16:11:43+00:00".to_string()));
        metadata.save(&path).unwrap();

        let reloaded = FetchMetadata::load(&path).unwrap();
        assert_eq!(reloaded.last_fetched_id("@health"), Some(42));
    }
}
