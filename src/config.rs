use crate::constants;
use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Immutable pipeline configuration. Loaded once at startup, validated, and
/// passed by reference into every stage constructor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub discovery: DiscoveryConfig,
    pub enrichment: EnrichmentConfig,
    pub matching: MatchingConfig,
    pub caption: CaptionConfig,
    pub posting: PostingConfig,
    pub output: OutputConfig,
    pub dashboard: DashboardConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub keywords: Vec<String>,
    pub min_items: usize,
    pub max_items: usize,
    pub placeholder_image: String,
    pub newsapi: NewsApiConfig,
    pub rss: RssConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            keywords: constants::DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            min_items: constants::DEFAULT_MIN_ITEMS,
            max_items: constants::DEFAULT_MAX_ITEMS,
            placeholder_image: constants::PLACEHOLDER_IMAGE.to_string(),
            newsapi: NewsApiConfig::default(),
            rss: RssConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsApiConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub language: String,
    pub page_size: u32,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: constants::NEWSAPI_ENDPOINT.to_string(),
            api_key: None,
            language: "en".to_string(),
            page_size: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RssConfig {
    pub enabled: bool,
    pub feed_url: String,
    /// Entry cap; falls back to `discovery.max_items` when unset
    pub max_entries: Option<usize>,
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_url: constants::GOOGLE_RSS_FEED_URL.to_string(),
            max_entries: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub summarizer_endpoint: String,
    pub api_token: Option<String>,
    pub max_length: usize,
    pub min_length: usize,
    /// Inputs with fewer whitespace tokens skip the summarizer
    pub min_tokens: usize,
    pub concurrency: usize,
    pub max_keywords: usize,
    /// Tokens must be longer than this to count as keywords
    pub min_keyword_chars: usize,
    pub fetch_article_text: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            summarizer_endpoint: constants::HUGGINGFACE_ENDPOINT.to_string(),
            api_token: None,
            max_length: 130,
            min_length: 30,
            min_tokens: 30,
            concurrency: 1,
            max_keywords: 5,
            min_keyword_chars: 5,
            fetch_article_text: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Matching blocks over words
    TokenSequence,
    /// Matching blocks over characters
    Sequence,
    JaroWinkler,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub metric: SimilarityMetric,
    pub cutoff: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::TokenSequence,
            cutoff: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub max_chars: usize,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self { max_chars: 280 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    pub dry_run: bool,
    pub twitter_bearer_token: Option<String>,
    pub linkedin_access_token: Option<String>,
    pub linkedin_user_id: Option<String>,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            twitter_bearer_token: None,
            linkedin_access_token: None,
            linkedin_user_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub log_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            log_dir: "logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    /// Display offset east of UTC in minutes (IST by default)
    pub display_offset_minutes: i32,
    pub time_format: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Drone News AI".to_string(),
            display_offset_minutes: 330,
            time_format: "%d-%b-%Y %I:%M %p".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 20,
            user_agent: concat!("news_pipeline/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load `path` if it exists (defaults otherwise), apply environment
    /// overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml_str(&content)?
        } else {
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Secrets and the dry-run switch come from the environment (and `.env`)
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = env("NEWS_API_KEY") {
            self.discovery.newsapi.api_key = Some(key);
        }
        if let Some(token) = env("HF_API_TOKEN") {
            self.enrichment.api_token = Some(token);
        }
        if let Some(token) = env("TW_BEARER_TOKEN") {
            self.posting.twitter_bearer_token = Some(token);
        }
        if let Some(token) = env("LINKEDIN_ACCESS_TOKEN") {
            self.posting.linkedin_access_token = Some(token);
        }
        if let Some(user) = env("LINKEDIN_USER_ID") {
            self.posting.linkedin_user_id = Some(user);
        }
        if let Some(flag) = env("NEWS_PIPELINE_DRY_RUN") {
            // Anything other than an explicit "false", "0" or "no" keeps dry-run on
            self.posting.dry_run = !matches!(flag.to_lowercase().as_str(), "false" | "0" | "no");
        }
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.discovery;
        if d.max_items == 0 {
            return Err(PipelineError::Config("discovery.max_items must be at least 1".into()));
        }
        if d.min_items > d.max_items {
            return Err(PipelineError::Config(format!(
                "discovery.min_items ({}) exceeds discovery.max_items ({})",
                d.min_items, d.max_items
            )));
        }
        if !(0.0..=1.0).contains(&self.matching.cutoff) {
            return Err(PipelineError::Config(format!(
                "matching.cutoff must be within [0, 1], got {}",
                self.matching.cutoff
            )));
        }
        let e = &self.enrichment;
        if e.min_length > e.max_length {
            return Err(PipelineError::Config(format!(
                "enrichment.min_length ({}) exceeds enrichment.max_length ({})",
                e.min_length, e.max_length
            )));
        }
        if e.concurrency == 0 {
            return Err(PipelineError::Config("enrichment.concurrency must be at least 1".into()));
        }
        if self.caption.max_chars == 0 {
            return Err(PipelineError::Config("caption.max_chars must be at least 1".into()));
        }
        Ok(())
    }

    pub fn rss_max_entries(&self) -> usize {
        self.discovery.rss.max_entries.unwrap_or(self.discovery.max_items)
    }

    pub fn articles_path(&self) -> PathBuf {
        self.output.dir.join(constants::ARTICLES_FILE)
    }

    pub fn summaries_path(&self) -> PathBuf {
        self.output.dir.join(constants::SUMMARIES_FILE)
    }

    pub fn posts_path(&self) -> PathBuf {
        self.output.dir.join(constants::SOCIAL_POSTS_FILE)
    }

    pub fn dashboard_path(&self) -> PathBuf {
        self.output.dir.join(constants::DASHBOARD_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid_and_dry_run() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.posting.dry_run);
        assert_eq!(config.discovery.min_items, 3);
        assert_eq!(config.discovery.max_items, 5);
        assert_eq!(config.rss_max_entries(), 5);
        assert_eq!(config.matching.metric, SimilarityMetric::TokenSequence);
    }

    #[test]
    fn test_dry_run_env_switch() {
        for (value, expected) in [("false", false), ("0", false), ("no", false), ("NO", false), ("true", true), ("off", true)] {
            let mut config = PipelineConfig::default();
            config.apply_overrides(|name| (name == "NEWS_PIPELINE_DRY_RUN").then(|| value.to_string()));
            assert_eq!(config.posting.dry_run, expected, "NEWS_PIPELINE_DRY_RUN={value}");
        }
    }

    #[test]
    fn test_secrets_come_from_environment() {
        let mut config = PipelineConfig::default();
        config.apply_overrides(|name| match name {
            "NEWS_API_KEY" => Some("key".to_string()),
            "HF_API_TOKEN" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.discovery.newsapi.api_key.as_deref(), Some("key"));
        assert!(config.enrichment.api_token.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [discovery]
            keywords = ["quadcopter"]
            max_items = 8

            [matching]
            metric = "jaro_winkler"
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.keywords, vec!["quadcopter".to_string()]);
        assert_eq!(config.discovery.max_items, 8);
        assert_eq!(config.discovery.min_items, 3);
        assert_eq!(config.matching.metric, SimilarityMetric::JaroWinkler);
        assert_eq!(config.matching.cutoff, 0.5);
        assert_eq!(config.enrichment.min_tokens, 30);
    }

    #[test]
    fn test_min_above_max_is_rejected() {
        let mut config = PipelineConfig::default();
        config.discovery.min_items = 6;
        config.discovery.max_items = 5;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(err.to_string().contains("min_items"));
    }

    #[test]
    fn test_out_of_range_cutoff_is_rejected() {
        let mut config = PipelineConfig::default();
        config.matching.cutoff = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut config = PipelineConfig::default();
        config.enrichment.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.discovery.max_items, 5);
    }
}
