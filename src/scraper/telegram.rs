use async_trait::async_trait;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

use crate::domain::ScrapedMessage;
use crate::error::Result;
use crate::scraper::ChannelClient;

/// Scrapes the public `t.me/s/<channel>` preview pages. These pages expose a
/// channel's recent history without credentials, which is all the warehouse
/// needs from public channels.
pub struct TelegramPreviewClient {
    client: reqwest::Client,
    base_url: String,
}

static BACKGROUND_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"url\('([^']+)'\)").unwrap());

impl Default for TelegramPreviewClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramPreviewClient {
    pub fn new() -> Self {
        Self::with_base_url("https://t.me/s".to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl ChannelClient for TelegramPreviewClient {
    fn client_name(&self) -> &'static str {
        "telegram_preview"
    }

    #[instrument(skip(self))]
    async fn fetch_messages(
        &self,
        channel: &str,
        limit: usize,
        min_id: Option<i64>,
    ) -> Result<Vec<ScrapedMessage>> {
        let url = format!("{}/{}", self.base_url, channel.trim_start_matches('@'));
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let mut messages = parse_preview_page(&body);

        if let Some(floor) = min_id {
            messages.retain(|m| m.id > floor);
        }
        // The page lists oldest first; keep the newest `limit`.
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }

        info!("Fetched {} messages from {channel}", messages.len());
        Ok(messages)
    }
}

/// Pull messages out of a preview page. Kept synchronous: `Html` is not Send,
/// so it must not live across an await point.
fn parse_preview_page(body: &str) -> Vec<ScrapedMessage> {
    let document = Html::parse_document(body);
    let message_selector = Selector::parse("div.tgme_widget_message").unwrap();
    let owner_selector = Selector::parse(".tgme_widget_message_owner_name").unwrap();
    let text_selector = Selector::parse(".tgme_widget_message_text").unwrap();
    let time_selector = Selector::parse("time").unwrap();
    let photo_selector = Selector::parse("a.tgme_widget_message_photo_wrap").unwrap();

    let mut messages = Vec::new();

    for element in document.select(&message_selector) {
        // data-post is "<channel>/<id>"
        let id = match element
            .value()
            .attr("data-post")
            .and_then(|post| post.rsplit('/').next())
            .and_then(|id| id.parse::<i64>().ok())
        {
            Some(id) => id,
            None => {
                debug!("Skipping message block without a usable data-post id");
                continue;
            }
        };

        let channel_name = element
            .select(&owner_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty());

        let text = element
            .select(&text_selector)
            .next()
            .map(|el| el.text().collect::<Vec<_>>().join("\n"));

        // The datetime attribute is RFC 3339; re-render it in the raw table's
        // space-separated form with the offset suffix kept.
        let timestamp = element
            .select(&time_selector)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .and_then(|dt| DateTime::parse_from_rfc3339(dt).ok())
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%:z").to_string());

        let media = element
            .select(&photo_selector)
            .next()
            .and_then(|el| el.value().attr("style"))
            .and_then(|style| {
                BACKGROUND_URL
                    .captures(style)
                    .map(|caps| caps[1].to_string())
            });

        messages.push(ScrapedMessage {
            id,
            channel_name,
            // Preview pages do not expose a numeric sender id.
            sender: None,
            timestamp,
            text,
            media,
        });
    }

    messages
}
