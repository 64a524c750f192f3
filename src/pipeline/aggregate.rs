use std::collections::HashSet;

use metrics::counter;
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::error::{PipelineError, Result};
use crate::metrics::ITEMS_DEDUPLICATED_TOTAL;
use crate::types::CanonicalItem;

/// Best-effort size bounds for one run's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationLimits {
    pub min_items: usize,
    pub max_items: usize,
}

impl AggregationLimits {
    pub fn new(min_items: usize, max_items: usize) -> Result<Self> {
        if max_items == 0 {
            return Err(PipelineError::Config("max_items must be at least 1".into()));
        }
        if min_items > max_items {
            return Err(PipelineError::Config(format!(
                "min_items ({min_items}) exceeds max_items ({max_items})"
            )));
        }
        Ok(Self { min_items, max_items })
    }

    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        Self::new(config.min_items, config.max_items)
    }
}

/// Merges per-source item lists into one ordered, link-unique, size-bounded list
pub struct Aggregator {
    limits: AggregationLimits,
}

impl Aggregator {
    pub fn new(limits: AggregationLimits) -> Self {
        Self { limits }
    }

    /// Newest first by `publishedAt` (missing timestamps last, stable among
    /// ties), first item per link wins, then the size policy. Items without a
    /// link are never treated as duplicates of anything.
    pub fn aggregate(&self, sources: Vec<Vec<CanonicalItem>>) -> Vec<CanonicalItem> {
        let mut merged: Vec<CanonicalItem> = sources.into_iter().flatten().collect();
        merged.sort_by(|a, b| b.sort_key().cmp(a.sort_key()));

        let mut seen: HashSet<String> = HashSet::new();
        let mut unique = Vec::with_capacity(merged.len());
        let mut dropped = 0u64;
        for item in merged {
            if let Some(link) = &item.link {
                if !seen.insert(link.clone()) {
                    debug!("Dropping duplicate link {}", link);
                    dropped += 1;
                    continue;
                }
            }
            unique.push(item);
        }
        if dropped > 0 {
            counter!(ITEMS_DEDUPLICATED_TOTAL).increment(dropped);
        }

        self.apply_size_policy(unique)
    }

    /// Below `min_items` the set is returned as-is; otherwise capped at `max_items`
    fn apply_size_policy(&self, mut items: Vec<CanonicalItem>) -> Vec<CanonicalItem> {
        if items.len() >= self.limits.min_items {
            items.truncate(self.limits.max_items);
        }
        items
    }
}
