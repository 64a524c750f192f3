use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

use news_pipeline::config::PipelineConfig;
use news_pipeline::infra::{HttpClientPort, ReqwestHttp};
use news_pipeline::pipeline::caption::CaptionComposer;
use news_pipeline::pipeline::matcher::CrossStageMatcher;
use news_pipeline::pipeline::orchestrator::{
    build_enrichment, run_captions, run_posting, run_summaries, DiscoveryStage,
};
use news_pipeline::pipeline::sink::PostingStage;
use news_pipeline::pipeline::store::{read_stage, write_stage};
use news_pipeline::types::{CanonicalItem, SocialPost, SummaryRecord};
use news_pipeline::{logging, server};

#[derive(Parser)]
#[command(name = "news_pipeline")]
#[command(about = "Discover, summarize and share drone industry news")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file (defaults apply when absent)
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, normalize and aggregate articles into articles.json
    Discover,
    /// Summarize articles.json into summaries.json
    Summarize,
    /// Compose social captions into social_posts.json
    Caption,
    /// Publish social_posts.json (dry run unless --live)
    Post {
        /// Actually call the platform APIs
        #[arg(long)]
        live: bool,
    },
    /// Render the HTML dashboard
    Dashboard {
        /// Serve the dashboard on this port instead of exiting
        #[arg(long)]
        serve: Option<u16>,
    },
    /// Run every stage in order
    Run,
}

fn http_client(config: &PipelineConfig) -> anyhow::Result<Arc<dyn HttpClientPort>> {
    let http = ReqwestHttp::new(&config.http).context("failed to build HTTP client")?;
    Ok(Arc::new(http))
}

async fn discover(config: &PipelineConfig) -> anyhow::Result<Vec<CanonicalItem>> {
    let stage = DiscoveryStage::from_config(config, http_client(config)?)?;
    let report = stage.run().await;

    println!("\n📊 Discovery results:");
    for source in &report.sources {
        match &source.error {
            Some(e) => println!("   {}: failed ({})", source.source, e),
            None => println!(
                "   {}: {} fetched, {} kept, {} malformed",
                source.source, source.fetched, source.normalized, source.malformed
            ),
        }
    }
    if report.items.is_empty() {
        warn!("No articles discovered this run");
    }
    write_stage(&config.articles_path(), &report.items)?;
    Ok(report.items)
}

async fn summarize(config: &PipelineConfig) -> anyhow::Result<Vec<SummaryRecord>> {
    let articles: Vec<CanonicalItem> = read_stage(&config.articles_path())?;
    let stage = build_enrichment(config, http_client(config)?);
    let report = run_summaries(stage, &articles).await;

    println!("📝 {} summaries written ({} failed)", report.records.len(), report.failed);
    write_stage(&config.summaries_path(), &report.records)?;
    Ok(report.records)
}

fn caption(config: &PipelineConfig) -> anyhow::Result<Vec<SocialPost>> {
    let summaries: Vec<SummaryRecord> = read_stage(&config.summaries_path())?;
    let articles: Vec<CanonicalItem> = read_stage(&config.articles_path())?;
    let composer = CaptionComposer::new(config.caption.max_chars, &config.discovery.placeholder_image);
    let matcher = CrossStageMatcher::from_config(&config.matching);

    let posts = run_captions(&composer, &matcher, &summaries, &articles);
    println!("✍️  {} captions written", posts.len());
    write_stage(&config.posts_path(), &posts)?;
    Ok(posts)
}

async fn post(config: &PipelineConfig) -> anyhow::Result<()> {
    let posts: Vec<SocialPost> = read_stage(&config.posts_path())?;
    let stage = PostingStage::from_config(&config.posting, http_client(config)?);
    if stage.platforms().is_empty() {
        warn!("No platforms configured; nothing will be posted");
    }
    let report = run_posting(&stage, &posts).await;

    println!(
        "📣 {}/{} posts succeeded{}",
        report.succeeded,
        report.attempted,
        if report.dry_run { " (dry run)" } else { "" }
    );
    for failure in &report.failures {
        println!("   - {}", failure);
    }
    Ok(())
}

fn dashboard(config: &PipelineConfig) -> anyhow::Result<()> {
    let html = server::render_dashboard(config)?;
    let path = config.dashboard_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, html).with_context(|| format!("failed to write {}", path.display()))?;
    println!("🖥️  Dashboard written to {}", path.display());
    Ok(())
}

async fn run_all(config: &PipelineConfig) -> anyhow::Result<()> {
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("pipeline_run", run_id = %run_id);

    async {
        info!("🚀 Starting pipeline run");
        println!("\n📥 Step 1: Discovering articles...");
        discover(config).await?;
        println!("\n📝 Step 2: Summarizing...");
        summarize(config).await?;
        println!("\n✍️  Step 3: Captioning...");
        caption(config)?;
        println!("\n📣 Step 4: Posting...");
        post(config).await?;
        println!("\n🖥️  Step 5: Rendering dashboard...");
        dashboard(config)?;
        info!("✅ Pipeline run finished");
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = PipelineConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    logging::init_logging(&config.output.log_dir);
    news_pipeline::metrics::init_metrics();

    let result = match cli.command {
        Commands::Discover => discover(&config).await.map(|_| ()),
        Commands::Summarize => summarize(&config).await.map(|_| ()),
        Commands::Caption => caption(&config).map(|_| ()),
        Commands::Post { live } => {
            if live {
                config.posting.dry_run = false;
            }
            post(&config).await
        }
        Commands::Dashboard { serve } => match serve {
            Some(port) => server::start_server(config, port).await,
            None => dashboard(&config),
        },
        Commands::Run => run_all(&config).await,
    };

    if let Err(e) = &result {
        error!("❌ {:#}", e);
    }
    result
}
