use tracing::debug;

use crate::config::MatchingConfig;
use crate::pipeline::similarity::{self, Similarity};
use crate::types::Joinable;

/// How a target was joined to its candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    /// Identical `link`
    Exact,
    /// Title similarity at or above the cutoff
    Fuzzy(f64),
}

/// Re-associates records across stage boundaries, by link when both sides
/// carry one and by title similarity otherwise
pub struct CrossStageMatcher {
    similarity: Box<dyn Similarity>,
    cutoff: f64,
}

impl CrossStageMatcher {
    pub fn new(similarity: Box<dyn Similarity>, cutoff: f64) -> Self {
        Self { similarity, cutoff }
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        Self::new(similarity::from_metric(config.metric), config.cutoff)
    }

    /// First candidate whose link equals the target's. Case-sensitive and
    /// unnormalized; a side without a link never matches.
    pub fn exact<'p, T, C>(&self, target: &T, pool: &'p [C]) -> Option<&'p C>
    where
        T: Joinable + ?Sized,
        C: Joinable,
    {
        let link = target.join_link()?;
        pool.iter().find(|c| c.join_link() == Some(link))
    }

    /// Highest-scoring candidate by title; scores below the cutoff are
    /// excluded and ties go to the earliest candidate in the pool.
    pub fn fuzzy<'p, T, C>(&self, target: &T, pool: &'p [C]) -> Option<(&'p C, f64)>
    where
        T: Joinable + ?Sized,
        C: Joinable,
    {
        let title = target.join_title();
        let mut best: Option<(&'p C, f64)> = None;
        for candidate in pool {
            // candidate first, target second
            let score = self.similarity.score(candidate.join_title(), title);
            if score < self.cutoff {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }
        if let Some((candidate, score)) = &best {
            debug!(
                "Fuzzy matched '{}' to '{}' (similarity: {:.2})",
                title,
                candidate.join_title(),
                score
            );
        }
        best
    }

    /// Exact link join when the target has a link and a candidate shares it,
    /// otherwise fall back to the fuzzy title join.
    pub fn resolve<'p, T, C>(&self, target: &T, pool: &'p [C]) -> Option<(&'p C, MatchKind)>
    where
        T: Joinable + ?Sized,
        C: Joinable,
    {
        if let Some(candidate) = self.exact(target, pool) {
            return Some((candidate, MatchKind::Exact));
        }
        self.fuzzy(target, pool)
            .map(|(candidate, score)| (candidate, MatchKind::Fuzzy(score)))
    }
}
