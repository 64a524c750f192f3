use std::net::SocketAddr;
use tracing::{info, warn};

pub const SOURCE_ITEMS_TOTAL: &str = "news_source_items_total";
pub const SOURCE_FAILURES_TOTAL: &str = "news_source_failures_total";
pub const ITEMS_MALFORMED_TOTAL: &str = "news_items_malformed_total";
pub const ITEMS_DEDUPLICATED_TOTAL: &str = "news_items_deduplicated_total";
pub const ENRICHMENT_BYPASSED_TOTAL: &str = "news_enrichment_bypassed_total";
pub const ENRICHMENT_FAILURES_TOTAL: &str = "news_enrichment_failures_total";
pub const POSTS_FAILED_TOTAL: &str = "news_posts_failed_total";
pub const STAGE_DURATION_SECONDS: &str = "news_stage_duration_seconds";

/// Installs the Prometheus exporter when `NEWS_METRICS_PORT` is set.
/// Without an installed recorder the metric macros are no-ops.
pub fn init_metrics() {
    let port: u16 = match std::env::var("NEWS_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        Some(port) => port,
        None => return,
    };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed (possibly already installed): {}", e),
    }
}
