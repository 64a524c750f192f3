pub mod google_rss;
pub mod newsapi;

pub use google_rss::GoogleRssSource;
pub use newsapi::NewsApiSource;

use crate::config::PipelineConfig;
use crate::infra::HttpClientPort;
use crate::types::NewsSource;
use std::sync::Arc;

/// Build the enabled source adapters, in the order their results are merged
pub fn create_sources(config: &PipelineConfig, http: Arc<dyn HttpClientPort>) -> Vec<Box<dyn NewsSource>> {
    let mut sources: Vec<Box<dyn NewsSource>> = Vec::new();
    if config.discovery.newsapi.enabled {
        sources.push(Box::new(NewsApiSource::new(
            http.clone(),
            config.discovery.newsapi.clone(),
            config.discovery.keywords.clone(),
        )));
    }
    if config.discovery.rss.enabled {
        sources.push(Box::new(GoogleRssSource::new(
            http,
            config.discovery.rss.feed_url.clone(),
            config.rss_max_entries(),
        )));
    }
    sources
}
