/// Source name constants shared by adapters, normalizers and the registry

pub const NEWSAPI_SOURCE: &str = "newsapi";
pub const GOOGLE_RSS_SOURCE: &str = "google_rss";

pub const NEWSAPI_ENDPOINT: &str = "https://newsapi.org/v2/everything";
pub const GOOGLE_RSS_FEED_URL: &str =
    "https://news.google.com/rss/search?q=drone+UAV+India&hl=en-IN&gl=IN&ceid=IN:en";
pub const HUGGINGFACE_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn";
pub const TWITTER_TWEETS_ENDPOINT: &str = "https://api.twitter.com/2/tweets";
pub const LINKEDIN_UGC_ENDPOINT: &str = "https://api.linkedin.com/v2/ugcPosts";

pub const PLACEHOLDER_IMAGE: &str = "https://images.unsplash.com/photo-1487219116710-23ffcb172b2b?w=600&auto=format&fit=crop&q=60";

pub const DEFAULT_KEYWORDS: &[&str] = &["latest drone news", "UAV technology", "DGCA drones India"];
pub const DEFAULT_MIN_ITEMS: usize = 3;
pub const DEFAULT_MAX_ITEMS: usize = 5;

// Hand-off files between stages
pub const ARTICLES_FILE: &str = "articles.json";
pub const SUMMARIES_FILE: &str = "summaries.json";
pub const SOCIAL_POSTS_FILE: &str = "social_posts.json";
pub const DASHBOARD_FILE: &str = "dashboard.html";

pub const TWITTER_PLATFORM: &str = "twitter";
pub const LINKEDIN_PLATFORM: &str = "linkedin";

/// Get all supported source names
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![NEWSAPI_SOURCE, GOOGLE_RSS_SOURCE]
}
