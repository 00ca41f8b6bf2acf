use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::domain::{CanonicalMessage, LinkField, RawMessage};
use crate::error::Result;
use crate::storage::Storage;

/// SQLite-backed storage for the raw and canonical message tables.
///
/// The pipeline is single-threaded over one batch, so a mutex around the
/// connection is enough; `commit_batch` wraps its work in an explicit
/// transaction so a failure part-way rolls the whole unit of work back.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS raw_telegram_messages (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id   BIGINT NOT NULL UNIQUE,
                channel_name TEXT NOT NULL,
                sender       TEXT NOT NULL,
                timestamp    TEXT NOT NULL,
                message      TEXT NOT NULL,
                media        TEXT NOT NULL,
                is_processed INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS telegram_messages (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id    BIGINT NOT NULL UNIQUE,
                channel_title TEXT NOT NULL,
                message       TEXT NOT NULL,
                message_date  TEXT NOT NULL,
                media_path    TEXT NOT NULL,
                emoji         TEXT NOT NULL,
                youtube       TEXT NOT NULL,
                website       TEXT NOT NULL,
                phone         TEXT NOT NULL
            );
            "#,
        )?;
        info!("Opened SQLite storage at {}", path.as_ref().display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn map_raw(row: &Row<'_>) -> rusqlite::Result<RawMessage> {
    Ok(RawMessage {
        message_id: row.get("message_id")?,
        channel_name: row.get("channel_name")?,
        sender: row.get("sender")?,
        timestamp: row.get("timestamp")?,
        message: row.get("message")?,
        media: row.get("media")?,
        is_processed: row.get::<_, i64>("is_processed")? != 0,
    })
}

// Link and phone columns are stored as JSON text (array or sentinel string);
// decode happens after the rusqlite row mapping so serde errors surface as
// our own error type.
type CanonicalColumns = (i64, String, String, String, String, String, String, String, String);

fn map_canonical_columns(row: &Row<'_>) -> rusqlite::Result<CanonicalColumns> {
    Ok((
        row.get("message_id")?,
        row.get("channel_title")?,
        row.get("message")?,
        row.get("message_date")?,
        row.get("media_path")?,
        row.get("emoji")?,
        row.get("youtube")?,
        row.get("website")?,
        row.get("phone")?,
    ))
}

fn decode_canonical(columns: CanonicalColumns) -> Result<CanonicalMessage> {
    let (message_id, channel_title, message, message_date, media_path, emoji, youtube, website, phone) =
        columns;
    Ok(CanonicalMessage {
        message_id,
        channel_title,
        message,
        message_date,
        media_path,
        emoji,
        youtube: serde_json::from_str::<LinkField>(&youtube)?,
        website: serde_json::from_str::<LinkField>(&website)?,
        phone: serde_json::from_str::<Vec<String>>(&phone)?,
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn insert_raw_messages(&self, messages: &[RawMessage]) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO raw_telegram_messages
             (message_id, channel_name, sender, timestamp, message, media, is_processed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
        )?;
        let mut inserted = 0;
        for msg in messages {
            inserted += stmt.execute(params![
                msg.message_id,
                msg.channel_name,
                msg.sender,
                msg.timestamp,
                msg.message,
                msg.media,
            ])?;
        }
        debug!("Inserted {} raw messages", inserted);
        Ok(inserted)
    }

    async fn fetch_unprocessed(&self) -> Result<Vec<RawMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT message_id, channel_name, sender, timestamp, message, media, is_processed
             FROM raw_telegram_messages WHERE is_processed = 0 ORDER BY id",
        )?;
        let rows = stmt.query_map([], map_raw)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    async fn commit_batch(
        &self,
        canonical: &[CanonicalMessage],
        raw_ids: &[i64],
    ) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO telegram_messages
                 (message_id, channel_title, message, message_date, media_path, emoji, youtube, website, phone)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for msg in canonical {
                inserted += insert.execute(params![
                    msg.message_id,
                    msg.channel_title,
                    msg.message,
                    msg.message_date,
                    msg.media_path,
                    msg.emoji,
                    serde_json::to_string(&msg.youtube)?,
                    serde_json::to_string(&msg.website)?,
                    serde_json::to_string(&msg.phone)?,
                ])?;
            }

            // Conditional update: only rows still unprocessed are claimed, so
            // two overlapping runs cannot both count the same row.
            let mut mark = tx.prepare(
                "UPDATE raw_telegram_messages SET is_processed = 1
                 WHERE message_id = ?1 AND is_processed = 0",
            )?;
            for id in raw_ids {
                mark.execute(params![id])?;
            }
        }
        tx.commit()?;
        debug!(
            "Committed batch: {} canonical rows, {} raw ids marked processed",
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
        let conn = self.conn.lock().unwrap();
        let columns = match channel_title {
            Some(filter) => {
                let mut stmt = conn.prepare(
                    "SELECT message_id, channel_title, message, message_date, media_path, emoji, youtube, website, phone
                     FROM telegram_messages
                     WHERE channel_title LIKE '%' || ?1 || '%' ORDER BY id LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![filter, limit as i64], map_canonical_columns)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT message_id, channel_title, message, message_date, media_path, emoji, youtube, website, phone
                     FROM telegram_messages ORDER BY id LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit as i64], map_canonical_columns)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        columns.into_iter().map(decode_canonical).collect()
    }

    async fn get_raw_messages(&self, limit: usize) -> Result<Vec<RawMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT message_id, channel_name, sender, timestamp, message, media, is_processed
             FROM raw_telegram_messages WHERE is_processed = 0 ORDER BY id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], map_raw)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    async fn update_message_text(&self, message_id: i64, text: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE telegram_messages SET message = ?2 WHERE message_id = ?1",
            params![message_id, text],
        )?;
        Ok(changed > 0)
    }

    async fn delete_message(&self, message_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM telegram_messages WHERE message_id = ?1",
            params![message_id],
        )?;
        Ok(changed > 0)
    }
}
