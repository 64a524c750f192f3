use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::apis::create_sources;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::infra::{ArticleTextSource, HtmlArticleText, HttpClientPort, NoArticleText};
use crate::metrics::{ITEMS_MALFORMED_TOTAL, SOURCE_FAILURES_TOTAL, SOURCE_ITEMS_TOTAL, STAGE_DURATION_SECONDS};
use crate::pipeline::aggregate::{AggregationLimits, Aggregator};
use crate::pipeline::caption::CaptionComposer;
use crate::pipeline::enrich::{is_error_marker, EnrichmentStage, HuggingFaceSummarizer, LeadSentenceSummarizer, Summarizer};
use crate::pipeline::matcher::CrossStageMatcher;
use crate::pipeline::normalize::NormalizationRegistry;
use crate::pipeline::sink::{PostingReport, PostingStage};
use crate::types::{CanonicalItem, NewsSource, SocialPost, SummaryRecord};

/// Per-source outcome of one discovery run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStats {
    pub source: String,
    pub fetched: usize,
    pub normalized: usize,
    pub malformed: usize,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryReport {
    pub items: Vec<CanonicalItem>,
    pub sources: Vec<SourceStats>,
}

impl DiscoveryReport {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Stage 1: fetch every source, normalize, aggregate
pub struct DiscoveryStage {
    sources: Vec<Box<dyn NewsSource>>,
    registry: NormalizationRegistry,
    aggregator: Aggregator,
}

impl DiscoveryStage {
    pub fn new(sources: Vec<Box<dyn NewsSource>>, registry: NormalizationRegistry, aggregator: Aggregator) -> Self {
        Self {
            sources,
            registry,
            aggregator,
        }
    }

    pub fn from_config(config: &PipelineConfig, http: Arc<dyn HttpClientPort>) -> Result<Self> {
        let limits = AggregationLimits::from_config(&config.discovery)?;
        Ok(Self::new(
            create_sources(config, http),
            NormalizationRegistry::new(&config.discovery.placeholder_image),
            Aggregator::new(limits),
        ))
    }

    /// Sources run one after another. A failing source contributes nothing;
    /// a malformed record is dropped on its own.
    #[instrument(skip(self))]
    pub async fn run(&self) -> DiscoveryReport {
        let started = Instant::now();
        let mut per_source = Vec::with_capacity(self.sources.len());
        let mut stats = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let name = source.source_name();
            let mut stat = SourceStats {
                source: name.to_string(),
                ..SourceStats::default()
            };
            info!("📡 Fetching from {}...", name);

            let raw_items = match source.fetch().await {
                Ok(raw_items) => raw_items,
                Err(e) => {
                    warn!("Source {} failed, continuing without it: {}", name, e);
                    counter!(SOURCE_FAILURES_TOTAL, "source" => name).increment(1);
                    stat.error = Some(e.to_string());
                    stats.push(stat);
                    per_source.push(Vec::new());
                    continue;
                }
            };
            stat.fetched = raw_items.len();

            let mut items = Vec::with_capacity(raw_items.len());
            for raw in &raw_items {
                match self.registry.normalize(name, raw) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        warn!("{}", e);
                        stat.malformed += 1;
                    }
                }
            }
            stat.normalized = items.len();
            counter!(SOURCE_ITEMS_TOTAL, "source" => name).increment(items.len() as u64);
            counter!(ITEMS_MALFORMED_TOTAL, "source" => name).increment(stat.malformed as u64);
            info!("✅ {} returned {} items ({} malformed)", name, stat.normalized, stat.malformed);

            stats.push(stat);
            per_source.push(items);
        }

        let items = self.aggregator.aggregate(per_source);
        histogram!(STAGE_DURATION_SECONDS, "stage" => "discover").record(started.elapsed().as_secs_f64());
        info!("📰 Discovery produced {} articles", items.len());
        DiscoveryReport { items, sources: stats }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub records: Vec<SummaryRecord>,
    pub failed: usize,
}

/// Stage 2 entry point
pub async fn run_summaries(stage: Arc<EnrichmentStage>, articles: &[CanonicalItem]) -> SummaryReport {
    let started = Instant::now();
    let records = stage.summarize_batch(articles).await;
    let failed = records.iter().filter(|r| is_error_marker(&r.summary)).count();
    histogram!(STAGE_DURATION_SECONDS, "stage" => "summarize").record(started.elapsed().as_secs_f64());
    info!("📝 Summarized {} articles ({} failed)", records.len(), failed);
    SummaryReport { records, failed }
}

/// Stage 3 entry point
pub fn run_captions(
    composer: &CaptionComposer,
    matcher: &CrossStageMatcher,
    summaries: &[SummaryRecord],
    articles: &[CanonicalItem],
) -> Vec<SocialPost> {
    let started = Instant::now();
    let posts = composer.compose_posts(summaries, articles, matcher);
    histogram!(STAGE_DURATION_SECONDS, "stage" => "caption").record(started.elapsed().as_secs_f64());
    info!("✍️ Composed {} captions", posts.len());
    posts
}

/// Stage 4 entry point
pub async fn run_posting(stage: &PostingStage, posts: &[SocialPost]) -> PostingReport {
    let started = Instant::now();
    let report = stage.run(posts).await;
    histogram!(STAGE_DURATION_SECONDS, "stage" => "post").record(started.elapsed().as_secs_f64());
    info!(
        "📣 Posting finished: {}/{} succeeded (dry run: {})",
        report.succeeded, report.attempted, report.dry_run
    );
    report
}

/// Hosted model when a token is configured, the extractive fallback otherwise
pub fn build_summarizer(config: &PipelineConfig, http: Arc<dyn HttpClientPort>) -> Arc<dyn Summarizer> {
    match &config.enrichment.api_token {
        Some(token) => Arc::new(HuggingFaceSummarizer::new(
            http,
            config.enrichment.summarizer_endpoint.clone(),
            token.clone(),
        )),
        None => {
            warn!("HF_API_TOKEN not set; using the offline lead-sentence summarizer");
            Arc::new(LeadSentenceSummarizer)
        }
    }
}

pub fn build_enrichment(config: &PipelineConfig, http: Arc<dyn HttpClientPort>) -> Arc<EnrichmentStage> {
    let text_source: Arc<dyn ArticleTextSource> = if config.enrichment.fetch_article_text {
        Arc::new(HtmlArticleText::new(http.clone()))
    } else {
        Arc::new(NoArticleText)
    };
    let summarizer = build_summarizer(config, http);
    Arc::new(EnrichmentStage::new(summarizer, text_source, &config.enrichment))
}
