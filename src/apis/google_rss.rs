use crate::constants::GOOGLE_RSS_SOURCE;
use crate::error::{PipelineError, Result};
use crate::infra::HttpClientPort;
use crate::types::{NewsSource, RawItem};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

/// RSS/Atom feed adapter: a single feed URL with a fixed entry cap
pub struct GoogleRssSource {
    http: Arc<dyn HttpClientPort>,
    feed_url: String,
    max_entries: usize,
}

impl GoogleRssSource {
    pub fn new(http: Arc<dyn HttpClientPort>, feed_url: String, max_entries: usize) -> Self {
        Self { http, feed_url, max_entries }
    }

    /// Flatten feed entries into the provider's raw record shape
    pub fn parse_feed(bytes: &[u8], max_entries: usize) -> Result<Vec<RawItem>> {
        let feed = feed_rs::parser::parse(bytes)
            .map_err(|e| PipelineError::unavailable(GOOGLE_RSS_SOURCE, format!("feed parse failed: {e}")))?;

        let items = feed
            .entries
            .into_iter()
            .take(max_entries)
            .map(|entry| {
                let link = entry.links.first().map(|l| l.href.clone());
                let image = entry
                    .media
                    .iter()
                    .flat_map(|m| m.thumbnails.iter())
                    .map(|t| t.image.uri.clone())
                    .next();
                json!({
                    "title": entry.title.map(|t| t.content),
                    "link": link,
                    "published": entry.published.map(|dt| dt.to_rfc3339()),
                    "image": image,
                })
            })
            .collect();
        Ok(items)
    }
}

#[async_trait::async_trait]
impl NewsSource for GoogleRssSource {
    fn source_name(&self) -> &'static str {
        GOOGLE_RSS_SOURCE
    }

    #[instrument(skip(self), fields(feed_url = %self.feed_url))]
    async fn fetch(&self) -> Result<Vec<RawItem>> {
        let response = self
            .http
            .get(&self.feed_url)
            .await
            .map_err(|e| PipelineError::unavailable(GOOGLE_RSS_SOURCE, e.to_string()))?;
        if !response.is_success() {
            return Err(PipelineError::unavailable(
                GOOGLE_RSS_SOURCE,
                format!("feed returned status {}", response.status),
            ));
        }

        let items = Self::parse_feed(&response.bytes, self.max_entries)?;
        info!("Fetched {} entries from RSS feed", items.len());
        Ok(items)
    }
}
