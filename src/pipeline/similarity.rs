use std::collections::HashMap;
use std::hash::Hash;

use crate::config::SimilarityMetric;

/// Score in `[0, 1]` for how alike two strings are; 1.0 means identical
pub trait Similarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

pub fn from_metric(metric: SimilarityMetric) -> Box<dyn Similarity> {
    match metric {
        SimilarityMetric::TokenSequence => Box::new(TokenRatio),
        SimilarityMetric::Sequence => Box::new(SequenceRatio),
        SimilarityMetric::JaroWinkler => Box::new(JaroWinkler),
    }
}

/// `2 * M / T` over whitespace-separated words. Titles without a word in
/// common always score 0.
pub struct TokenRatio;

impl Similarity for TokenRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a: Vec<&str> = a.split_whitespace().collect();
        let b: Vec<&str> = b.split_whitespace().collect();
        block_ratio(&a, &b)
    }
}

/// `2 * M / T`, where `M` is the total size of the matching blocks found by
/// recursively taking the longest common substring on either side of the
/// previous one, and `T` the combined length. Case-sensitive, per character.
pub struct SequenceRatio;

impl Similarity for SequenceRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        block_ratio(&a, &b)
    }
}

fn block_ratio<T: Copy + Eq + Hash>(a: &[T], b: &[T]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = BlockMatcher::new(a, b).matched_len();
    2.0 * matched as f64 / total as f64
}

/// Longest-matching-block search over two sequences
struct BlockMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    /// Positions of each element of `b`, ascending; very common elements in
    /// long inputs are left out, matching the classic popularity heuristic
    b2j: HashMap<T, Vec<usize>>,
}

impl<'a, T: Copy + Eq + Hash> BlockMatcher<'a, T> {
    fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b2j: HashMap<T, Vec<usize>> = HashMap::new();
        for (j, x) in b.iter().enumerate() {
            b2j.entry(*x).or_default().push(j);
        }
        let n = b.len();
        if n >= 200 {
            let limit = n / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }
        Self { a, b, b2j }
    }

    fn matched_len(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        total
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the window; earliest `i`
    /// wins, then earliest `j`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Grow the block across elements that were excluded as too common
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi && best_j + best_k < bhi && self.a[best_i + best_k] == self.b[best_j + best_k] {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }
}

/// Jaro-Winkler similarity from `strsim`; kinder to shared prefixes
pub struct JaroWinkler;

impl Similarity for JaroWinkler {
    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }
}
