use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Raw item as returned from a provider; each provider has its own schema
pub type RawItem = serde_json::Value;

/// Source-agnostic news item, the spine of every stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalItem {
    pub title: String,
    pub link: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    pub image: String,
}

impl CanonicalItem {
    /// Ordering key; a missing timestamp sorts as the empty string (lowest).
    pub fn sort_key(&self) -> &str {
        self.published_at.as_deref().unwrap_or("")
    }
}

/// Stage 2 row: summary text plus extracted tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub title: String,
    pub link: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Stage 3 row. Carries no link, so joins against it are title-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialPost {
    pub title: String,
    pub caption: String,
    pub image: String,
}

/// Fields a record exposes for cross-stage joins
pub trait Joinable {
    fn join_title(&self) -> &str;

    fn join_link(&self) -> Option<&str> {
        None
    }
}

/// A record computed from a canonical item by an enrichment stage: the text
/// shown for it and the public tags that travel with it
pub trait DerivedArtifact: Joinable {
    fn body(&self) -> &str;

    fn tags(&self) -> Option<&[String]> {
        None
    }
}

impl Joinable for CanonicalItem {
    fn join_title(&self) -> &str {
        &self.title
    }

    fn join_link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

impl Joinable for SummaryRecord {
    fn join_title(&self) -> &str {
        &self.title
    }

    fn join_link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

impl DerivedArtifact for SummaryRecord {
    fn body(&self) -> &str {
        &self.summary
    }

    fn tags(&self) -> Option<&[String]> {
        Some(&self.hashtags)
    }
}

impl Joinable for SocialPost {
    fn join_title(&self) -> &str {
        &self.title
    }
}

impl DerivedArtifact for SocialPost {
    fn body(&self) -> &str {
        &self.caption
    }
}

/// Core trait that all news providers must implement
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// Unique identifier for this provider, also the normalizer registry key
    fn source_name(&self) -> &'static str;

    /// Fetch raw items; a whole-source failure is `SourceUnavailable`
    async fn fetch(&self) -> Result<Vec<RawItem>>;
}
