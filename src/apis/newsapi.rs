use crate::config::NewsApiConfig;
use crate::constants::NEWSAPI_SOURCE;
use crate::error::{PipelineError, Result};
use crate::infra::HttpClientPort;
use crate::types::{NewsSource, RawItem};
use reqwest::Url;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Keyword-query REST adapter: one `/everything` request per keyword,
/// results merged in keyword order.
pub struct NewsApiSource {
    http: Arc<dyn HttpClientPort>,
    config: NewsApiConfig,
    keywords: Vec<String>,
}

impl NewsApiSource {
    pub fn new(http: Arc<dyn HttpClientPort>, config: NewsApiConfig, keywords: Vec<String>) -> Self {
        Self { http, config, keywords }
    }

    fn query_url(&self, keyword: &str, api_key: &str) -> Result<Url> {
        let page_size = self.config.page_size.to_string();
        Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("q", keyword),
                ("language", self.config.language.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("apiKey", api_key),
            ],
        )
        .map_err(|e| PipelineError::Config(format!("Invalid NewsAPI endpoint: {e}")))
    }

    async fn fetch_keyword(&self, keyword: &str, api_key: &str) -> Result<Vec<RawItem>> {
        let url = self.query_url(keyword, api_key)?;
        let response = self.http.get(url.as_str()).await?;
        let body = response.json()?;

        if !response.is_success() || body["status"].as_str() == Some("error") {
            let message = body["message"].as_str().unwrap_or("unknown error");
            return Err(PipelineError::unavailable(
                NEWSAPI_SOURCE,
                format!("status {}: {}", response.status, message),
            ));
        }

        Ok(body["articles"].as_array().cloned().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl NewsSource for NewsApiSource {
    fn source_name(&self) -> &'static str {
        NEWSAPI_SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<RawItem>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| PipelineError::unavailable(NEWSAPI_SOURCE, "NEWS_API_KEY is not configured"))?;

        let mut articles = Vec::new();
        let mut failures = 0;
        for keyword in &self.keywords {
            match self.fetch_keyword(keyword, api_key).await {
                Ok(batch) => {
                    debug!("Keyword '{}' returned {} articles", keyword, batch.len());
                    articles.extend(batch);
                }
                Err(e) => {
                    warn!("NewsAPI query for '{}' failed: {}", keyword, e);
                    failures += 1;
                }
            }
        }

        if !self.keywords.is_empty() && failures == self.keywords.len() {
            return Err(PipelineError::unavailable(NEWSAPI_SOURCE, "every keyword query failed"));
        }

        info!("Fetched {} articles from NewsAPI", articles.len());
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::StaticHttp;

    fn config_with_key() -> NewsApiConfig {
        NewsApiConfig {
            api_key: Some("secret".to_string()),
            ..NewsApiConfig::default()
        }
    }

    #[tokio::test]
    async fn test_merges_results_across_keywords() {
        let http = StaticHttp::new()
            .with_body(
                "https://newsapi.org/v2/everything?q=drones",
                r#"{"status":"ok","articles":[{"title":"A","url":"https://a.example/1"}]}"#,
            )
            .with_body(
                "https://newsapi.org/v2/everything?q=uav",
                r#"{"status":"ok","articles":[{"title":"B","url":"https://b.example/1"},{"title":"C","url":null}]}"#,
            );
        let http = Arc::new(http);
        let source = NewsApiSource::new(
            http.clone(),
            config_with_key(),
            vec!["drones".to_string(), "uav".to_string()],
        );

        let items = source.fetch().await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["title"], "A");
        assert_eq!(items[2]["title"], "C");
        assert_eq!(http.request_count(), 2);
    }

    #[tokio::test]
    async fn test_query_string_carries_parameters() {
        let source = NewsApiSource::new(Arc::new(StaticHttp::new()), config_with_key(), vec![]);
        let url = source.query_url("latest drone news", "k").unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("q=latest+drone+news"));
        assert!(query.contains("sortBy=publishedAt"));
        assert!(query.contains("pageSize=5"));
        assert!(query.contains("language=en"));
    }

    #[tokio::test]
    async fn test_one_failing_keyword_does_not_fail_source() {
        let http = StaticHttp::new()
            .with_failure("https://newsapi.org/v2/everything?q=bad", "connection reset")
            .with_body(
                "https://newsapi.org/v2/everything?q=good",
                r#"{"status":"ok","articles":[{"title":"A"}]}"#,
            );
        let source = NewsApiSource::new(
            Arc::new(http),
            config_with_key(),
            vec!["bad".to_string(), "good".to_string()],
        );

        assert_eq!(source.fetch().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_all_keywords_failing_is_source_unavailable() {
        let http = StaticHttp::new().with_status(
            "https://newsapi.org",
            401,
            r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid"}"#,
        );
        let source = NewsApiSource::new(Arc::new(http), config_with_key(), vec!["drones".to_string()]);

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_source_unavailable() {
        let source = NewsApiSource::new(
            Arc::new(StaticHttp::new()),
            NewsApiConfig::default(),
            vec!["drones".to_string()],
        );
        assert!(matches!(
            source.fetch().await,
            Err(PipelineError::SourceUnavailable { .. })
        ));
    }
}
