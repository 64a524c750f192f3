use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::config::EnrichmentConfig;
use crate::error::{PipelineError, Result};
use crate::infra::{ArticleTextSource, HttpClientPort};
use crate::metrics::{ENRICHMENT_BYPASSED_TOTAL, ENRICHMENT_FAILURES_TOTAL};
use crate::pipeline::keywords::{ExtractedTags, KeywordExtractor};
use crate::types::{CanonicalItem, SummaryRecord};

/// The summarization model, an external collaborator
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Result<String>;
}

/// Hosted inference endpoint for a seq2seq summarization model
pub struct HuggingFaceSummarizer {
    http: Arc<dyn HttpClientPort>,
    endpoint: String,
    api_token: String,
}

impl HuggingFaceSummarizer {
    pub fn new(http: Arc<dyn HttpClientPort>, endpoint: String, api_token: String) -> Self {
        Self { http, endpoint, api_token }
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Result<String> {
        let body = json!({
            "inputs": text,
            "parameters": {
                "max_length": max_len,
                "min_length": min_len,
                "do_sample": false
            },
            "options": { "wait_for_model": true }
        });
        let response = self
            .http
            .post_json(&self.endpoint, Some(&self.api_token), &body)
            .await
            .map_err(|e| PipelineError::EnrichmentFailure(e.to_string()))?;
        let value = response
            .json()
            .map_err(|e| PipelineError::EnrichmentFailure(format!("unreadable response: {e}")))?;

        if !response.is_success() {
            let reason = value["error"].as_str().unwrap_or("no error message");
            return Err(PipelineError::EnrichmentFailure(format!(
                "status {}: {}",
                response.status, reason
            )));
        }

        value[0]["summary_text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PipelineError::EnrichmentFailure("response carried no summary_text".into()))
    }
}

/// Offline extractive fallback: leading sentences until `min_len` words are
/// covered, never more than `max_len` words.
pub struct LeadSentenceSummarizer;

#[async_trait]
impl Summarizer for LeadSentenceSummarizer {
    async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Result<String> {
        let mut words: Vec<&str> = Vec::new();
        for sentence in split_sentences(text) {
            let sentence_words: Vec<&str> = sentence.split_whitespace().collect();
            if !words.is_empty() && words.len() + sentence_words.len() > max_len {
                break;
            }
            words.extend(sentence_words);
            if words.len() >= min_len {
                break;
            }
        }
        words.truncate(max_len);
        if words.is_empty() {
            return Err(PipelineError::EnrichmentFailure("no text to summarize".into()));
        }
        Ok(words.join(" "))
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map(|(_, next)| next.is_whitespace()).unwrap_or(true);
            if at_boundary {
                let end = idx + c.len_utf8();
                sentences.push(text[start..end].trim());
                start = end;
            }
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Derived body plus tags for one input text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub body: String,
    pub tags: ExtractedTags,
}

/// Wraps the summarizer with the short-input bypass and per-item error
/// isolation, and builds stage 2 records.
pub struct EnrichmentStage {
    summarizer: Arc<dyn Summarizer>,
    text_source: Arc<dyn ArticleTextSource>,
    extractor: KeywordExtractor,
    max_length: usize,
    min_length: usize,
    min_tokens: usize,
    concurrency: usize,
}

impl EnrichmentStage {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        text_source: Arc<dyn ArticleTextSource>,
        config: &EnrichmentConfig,
    ) -> Self {
        Self {
            summarizer,
            text_source,
            extractor: KeywordExtractor::new(config.max_keywords, config.min_keyword_chars),
            max_length: config.max_length,
            min_length: config.min_length,
            min_tokens: config.min_tokens,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Never fails: short input is returned verbatim, summarizer errors
    /// become a visible marker body. Tags are only extracted from a real
    /// summary.
    pub async fn enrich(&self, text: &str) -> Enrichment {
        let token_count = text.split_whitespace().count();
        if token_count < self.min_tokens {
            debug!("Skipping summarizer for {}-token input", token_count);
            counter!(ENRICHMENT_BYPASSED_TOTAL).increment(1);
            return Enrichment {
                body: text.to_string(),
                tags: ExtractedTags::default(),
            };
        }

        match self.summarizer.summarize(text, self.max_length, self.min_length).await {
            Ok(body) => {
                let tags = self.extractor.extract(&body);
                Enrichment { body, tags }
            }
            Err(e) => {
                warn!("Summarization failed: {}", e);
                counter!(ENRICHMENT_FAILURES_TOTAL).increment(1);
                Enrichment {
                    body: error_marker(&e),
                    tags: ExtractedTags::default(),
                }
            }
        }
    }

    /// Full article text when obtainable, otherwise the title
    async fn source_text(&self, item: &CanonicalItem) -> String {
        match &item.link {
            Some(link) => match self.text_source.fetch_text(link).await {
                Some(text) => text,
                None => item.title.clone(),
            },
            None => item.title.clone(),
        }
    }

    #[instrument(skip(self, item), fields(title = %item.title))]
    pub async fn summarize_item(&self, item: &CanonicalItem) -> SummaryRecord {
        let text = self.source_text(item).await;
        let enrichment = self.enrich(&text).await;
        SummaryRecord {
            title: item.title.clone(),
            link: item.link.clone(),
            published_at: item.published_at.clone(),
            summary: enrichment.body,
            hashtags: enrichment.tags.hashtags,
            keywords: enrichment.tags.keywords,
        }
    }

    /// One record per item, in input order regardless of concurrency
    pub async fn summarize_batch(self: Arc<Self>, items: &[CanonicalItem]) -> Vec<SummaryRecord> {
        if self.concurrency <= 1 {
            let mut records = Vec::with_capacity(items.len());
            for item in items {
                records.push(self.summarize_item(item).await);
            }
            return records;
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (index, item) in items.iter().cloned().enumerate() {
            let stage = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, stage.summarize_item(&item).await)
            });
        }

        let mut slots: Vec<Option<SummaryRecord>> = vec![None; items.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, record)) => slots[index] = Some(record),
                Err(e) => warn!("Summarization task aborted: {}", e),
            }
        }

        let records: Vec<SummaryRecord> = slots
            .into_iter()
            .zip(items)
            .map(|(slot, item)| {
                slot.unwrap_or_else(|| {
                    let reason = PipelineError::EnrichmentFailure("task aborted".into());
                    SummaryRecord {
                        title: item.title.clone(),
                        link: item.link.clone(),
                        published_at: item.published_at.clone(),
                        summary: error_marker(&reason),
                        hashtags: Vec::new(),
                        keywords: Vec::new(),
                    }
                })
            })
            .collect();
        info!("Summarized {} items with concurrency {}", records.len(), self.concurrency);
        records
    }
}

const ERROR_MARKER_PREFIX: &str = "[Error summarizing:";

/// Whether a body is the placeholder written for a failed summarization
pub fn is_error_marker(body: &str) -> bool {
    body.starts_with(ERROR_MARKER_PREFIX)
}

fn error_marker(error: &PipelineError) -> String {
    match error {
        PipelineError::EnrichmentFailure(reason) => format!("{ERROR_MARKER_PREFIX} {reason}]"),
        other => format!("{ERROR_MARKER_PREFIX} {other}]"),
    }
}
