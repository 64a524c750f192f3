use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::PostingConfig;
use crate::constants::{LINKEDIN_PLATFORM, LINKEDIN_UGC_ENDPOINT, TWITTER_PLATFORM, TWITTER_TWEETS_ENDPOINT};
use crate::error::{PipelineError, Result};
use crate::infra::HttpClientPort;
use crate::metrics::POSTS_FAILED_TOTAL;
use crate::types::SocialPost;

/// A social platform the pipeline can publish to
#[async_trait]
pub trait SocialPoster: Send + Sync {
    fn platform(&self) -> &'static str;

    async fn post(&self, caption: &str, image_url: &str) -> Result<()>;
}

/// X/Twitter v2 `POST /2/tweets` with an OAuth 2.0 user bearer token.
/// Media upload needs the OAuth 1.0a v1.1 endpoint, so the image URL is
/// not attached.
pub struct TwitterPoster {
    http: Arc<dyn HttpClientPort>,
    bearer_token: String,
}

impl TwitterPoster {
    pub fn new(http: Arc<dyn HttpClientPort>, bearer_token: String) -> Self {
        Self { http, bearer_token }
    }
}

#[async_trait]
impl SocialPoster for TwitterPoster {
    fn platform(&self) -> &'static str {
        TWITTER_PLATFORM
    }

    async fn post(&self, caption: &str, image_url: &str) -> Result<()> {
        if !image_url.is_empty() {
            debug!("Twitter post is text only; image {} not attached", image_url);
        }
        let body = json!({ "text": caption });
        let response = self
            .http
            .post_json(TWITTER_TWEETS_ENDPOINT, Some(&self.bearer_token), &body)
            .await
            .map_err(|e| PipelineError::sink(TWITTER_PLATFORM, e.to_string()))?;
        if !response.is_success() {
            return Err(PipelineError::sink(
                TWITTER_PLATFORM,
                format!("status {}: {}", response.status, response.text()),
            ));
        }
        Ok(())
    }
}

/// LinkedIn UGC share on behalf of a person
pub struct LinkedInPoster {
    http: Arc<dyn HttpClientPort>,
    access_token: String,
    user_id: String,
}

impl LinkedInPoster {
    pub fn new(http: Arc<dyn HttpClientPort>, access_token: String, user_id: String) -> Self {
        Self { http, access_token, user_id }
    }

    pub fn payload(&self, caption: &str, image_url: &str) -> serde_json::Value {
        json!({
            "author": format!("urn:li:person:{}", self.user_id),
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": caption },
                    "shareMediaCategory": "ARTICLE",
                    "media": [{ "status": "READY", "originalUrl": image_url }]
                }
            },
            "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" }
        })
    }
}

#[async_trait]
impl SocialPoster for LinkedInPoster {
    fn platform(&self) -> &'static str {
        LINKEDIN_PLATFORM
    }

    async fn post(&self, caption: &str, image_url: &str) -> Result<()> {
        let body = self.payload(caption, image_url);
        let response = self
            .http
            .post_json(LINKEDIN_UGC_ENDPOINT, Some(&self.access_token), &body)
            .await
            .map_err(|e| PipelineError::sink(LINKEDIN_PLATFORM, e.to_string()))?;
        // LinkedIn answers 201 Created on success
        if response.status != 201 {
            return Err(PipelineError::sink(
                LINKEDIN_PLATFORM,
                format!("status {}: {}", response.status, response.text()),
            ));
        }
        Ok(())
    }
}

/// Outcome of one posting run
#[derive(Debug, Default, Serialize)]
pub struct PostingReport {
    pub dry_run: bool,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<String>,
}

/// Sends every post to every configured platform. In dry-run mode (the
/// default) the payload is only logged.
pub struct PostingStage {
    posters: Vec<Box<dyn SocialPoster>>,
    dry_run: bool,
}

impl PostingStage {
    pub fn new(posters: Vec<Box<dyn SocialPoster>>, dry_run: bool) -> Self {
        Self { posters, dry_run }
    }

    /// Posters for the platforms that have credentials configured. Dry runs
    /// preview every platform, credentials or not.
    pub fn from_config(config: &PostingConfig, http: Arc<dyn HttpClientPort>) -> Self {
        let mut posters: Vec<Box<dyn SocialPoster>> = Vec::new();
        match (&config.twitter_bearer_token, config.dry_run) {
            (Some(token), _) => posters.push(Box::new(TwitterPoster::new(http.clone(), token.clone()))),
            (None, true) => posters.push(Box::new(TwitterPoster::new(http.clone(), String::new()))),
            (None, false) => warn!("Twitter credentials missing; skipping {}", TWITTER_PLATFORM),
        }
        match (&config.linkedin_access_token, &config.linkedin_user_id, config.dry_run) {
            (Some(token), Some(user), _) => {
                posters.push(Box::new(LinkedInPoster::new(http, token.clone(), user.clone())))
            }
            (_, _, true) => posters.push(Box::new(LinkedInPoster::new(
                http,
                String::new(),
                config.linkedin_user_id.clone().unwrap_or_default(),
            ))),
            _ => warn!("LinkedIn credentials missing; skipping {}", LINKEDIN_PLATFORM),
        }
        Self::new(posters, config.dry_run)
    }

    pub fn platforms(&self) -> Vec<&'static str> {
        self.posters.iter().map(|p| p.platform()).collect()
    }

    pub async fn run(&self, posts: &[SocialPost]) -> PostingReport {
        let mut report = PostingReport {
            dry_run: self.dry_run,
            ..PostingReport::default()
        };

        for post in posts {
            info!("Preparing to post: {}", post.title);
            for poster in &self.posters {
                report.attempted += 1;
                if self.dry_run {
                    info!(
                        platform = poster.platform(),
                        caption = %post.caption,
                        image = %post.image,
                        "[DRY RUN] post preview"
                    );
                    report.succeeded += 1;
                    continue;
                }
                match poster.post(&post.caption, &post.image).await {
                    Ok(()) => {
                        info!("Posted '{}' to {}", post.title, poster.platform());
                        report.succeeded += 1;
                    }
                    Err(e) => {
                        error!("{}", e);
                        counter!(POSTS_FAILED_TOTAL, "platform" => poster.platform()).increment(1);
                        report.failures.push(e.to_string());
                    }
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::StaticHttp;

    fn posts() -> Vec<SocialPost> {
        vec![
            SocialPost {
                title: "One".to_string(),
                caption: "Caption one #Drones".to_string(),
                image: "https://img.example/1.jpg".to_string(),
            },
            SocialPost {
                title: "Two".to_string(),
                caption: "Caption two".to_string(),
                image: "https://img.example/2.jpg".to_string(),
            },
        ]
    }

    fn live_config() -> PostingConfig {
        PostingConfig {
            dry_run: false,
            twitter_bearer_token: Some("tw".to_string()),
            linkedin_access_token: Some("li".to_string()),
            linkedin_user_id: Some("abc123".to_string()),
        }
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_requests() {
        let http = Arc::new(StaticHttp::new());
        let config = PostingConfig { dry_run: true, ..live_config() };
        let stage = PostingStage::from_config(&config, http.clone());

        let report = stage.run(&posts()).await;
        assert!(report.dry_run);
        assert_eq!(report.attempted, 4);
        assert_eq!(report.succeeded, 4);
        assert_eq!(http.request_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_remaining_posts() {
        let http = Arc::new(
            StaticHttp::new()
                .with_status(TWITTER_TWEETS_ENDPOINT, 403, r#"{"detail":"Forbidden"}"#)
                .with_status(LINKEDIN_UGC_ENDPOINT, 201, "{}"),
        );
        let stage = PostingStage::from_config(&live_config(), http.clone());

        let report = stage.run(&posts()).await;
        assert_eq!(report.attempted, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].contains("twitter"));
        assert_eq!(http.request_count(), 4);
    }

    #[test]
    fn test_missing_credentials_skip_platforms_when_live() {
        let config = PostingConfig { dry_run: false, ..PostingConfig::default() };
        let stage = PostingStage::from_config(&config, Arc::new(StaticHttp::new()));
        assert!(stage.platforms().is_empty());
    }

    #[test]
    fn test_dry_run_previews_every_platform() {
        let stage = PostingStage::from_config(&PostingConfig::default(), Arc::new(StaticHttp::new()));
        assert_eq!(stage.platforms(), vec![TWITTER_PLATFORM, LINKEDIN_PLATFORM]);
    }

    #[tokio::test]
    async fn test_twitter_sends_text_without_media() {
        let http = Arc::new(StaticHttp::new().with_status(TWITTER_TWEETS_ENDPOINT, 201, "{}"));
        let poster = TwitterPoster::new(http.clone(), "tw".into());

        poster.post("Caption one #Drones", "https://img.example/1.jpg").await.unwrap();
        let posted = http.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0], json!({ "text": "Caption one #Drones" }));
    }

    #[test]
    fn test_linkedin_payload_shape() {
        let poster = LinkedInPoster::new(Arc::new(StaticHttp::new()), "t".into(), "abc123".into());
        let payload = poster.payload("Hello", "https://img.example/1.jpg");
        assert_eq!(payload["author"], "urn:li:person:abc123");
        assert_eq!(
            payload["specificContent"]["com.linkedin.ugc.ShareContent"]["media"][0]["originalUrl"],
            "https://img.example/1.jpg"
        );
    }
}
