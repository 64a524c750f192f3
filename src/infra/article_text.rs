use crate::infra::http_client::HttpClientPort;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::debug;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Full-text lookup for an article link. `None` means "use the title instead".
#[async_trait]
pub trait ArticleTextSource: Send + Sync {
    async fn fetch_text(&self, link: &str) -> Option<String>;
}

/// Downloads the article page and joins its paragraph text
pub struct HtmlArticleText {
    http: Arc<dyn HttpClientPort>,
}

impl HtmlArticleText {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ArticleTextSource for HtmlArticleText {
    async fn fetch_text(&self, link: &str) -> Option<String> {
        let response = match self.http.get(link).await {
            Ok(r) if r.is_success() => r,
            Ok(r) => {
                debug!("Article fetch for {} returned status {}", link, r.status);
                return None;
            }
            Err(e) => {
                debug!("Article fetch for {} failed: {}", link, e);
                return None;
            }
        };
        extract_paragraph_text(&response.text())
    }
}

/// Paragraphs under `<article>` when present, otherwise every `<p>` on the page
pub fn extract_paragraph_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let article_selector = Selector::parse("article p").ok()?;
    let any_selector = Selector::parse("p").ok()?;

    let mut paragraphs: Vec<String> = document
        .select(&article_selector)
        .map(|p| p.text().collect::<String>())
        .collect();
    if paragraphs.is_empty() {
        paragraphs = document
            .select(&any_selector)
            .map(|p| p.text().collect::<String>())
            .collect();
    }

    let text = paragraphs
        .iter()
        .map(|p| WHITESPACE.replace_all(p.trim(), " ").into_owned())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Used when full-text fetching is switched off
pub struct NoArticleText;

#[async_trait]
impl ArticleTextSource for NoArticleText {
    async fn fetch_text(&self, _link: &str) -> Option<String> {
        None
    }
}
