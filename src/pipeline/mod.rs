// News pipeline: discovery, enrichment, captioning, posting and the dashboard

pub mod aggregate;
pub mod caption;
pub mod enrich;
pub mod keywords;
pub mod matcher;
pub mod normalize;
pub mod orchestrator;
pub mod render;
pub mod similarity;
pub mod sink;
pub mod store;

pub use aggregate::{AggregationLimits, Aggregator};
pub use matcher::{CrossStageMatcher, MatchKind};
pub use orchestrator::{DiscoveryReport, DiscoveryStage, SummaryReport};
pub use render::DashboardRenderer;
