// 🔍 Fuzzy Matcher - Autocomplete suggestions over catalog meal names
// Two scoring rules: substring hit (1.0) or matching-blocks similarity ratio

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default minimum score a candidate needs to be suggested
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Default cap on the number of suggestions returned
pub const DEFAULT_MAX_RESULTS: usize = 8;

// ============================================================================
// MATCH RESULT
// ============================================================================

/// A scored candidate. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub name: String,

    /// Similarity score (0.0 - 1.0)
    pub score: f64,
}

// ============================================================================
// FUZZY MATCHER
// ============================================================================

pub struct FuzzyMatcher {
    /// Candidates scoring below this are dropped (default: 0.4)
    pub threshold: f64,

    /// Maximum number of results (default: 8)
    pub max_results: usize,
}

impl FuzzyMatcher {
    /// Create matcher with default threshold and result cap
    pub fn new() -> Self {
        FuzzyMatcher {
            threshold: DEFAULT_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        FuzzyMatcher {
            threshold,
            ..Self::new()
        }
    }

    /// Rank candidates against the query, best first.
    ///
    /// Equal scores keep the original candidate order.
    pub fn rank<S: AsRef<str>>(&self, query: &str, candidates: &[S]) -> Vec<MatchResult> {
        if query.is_empty() {
            return Vec::new();
        }

        let query_lower = query.to_lowercase();

        let mut matches: Vec<MatchResult> = candidates
            .iter()
            .filter_map(|candidate| {
                let candidate = candidate.as_ref();
                let score = score(&query_lower, &candidate.to_lowercase());
                if score >= self.threshold {
                    Some(MatchResult {
                        name: candidate.to_string(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        // sort_by is stable, so ties stay in candidate order
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        matches.truncate(self.max_results);
        matches
    }

    /// Ranked names only
    pub fn find_matches<S: AsRef<str>>(&self, query: &str, candidates: &[S]) -> Vec<String> {
        self.rank(query, candidates)
            .into_iter()
            .map(|m| m.name)
            .collect()
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Suggest up to 8 candidate names for `query` using the given threshold
pub fn find_matches<S: AsRef<str>>(query: &str, candidates: &[S], threshold: f64) -> Vec<String> {
    FuzzyMatcher::with_threshold(threshold).find_matches(query, candidates)
}

// ============================================================================
// SCORING
// ============================================================================

/// Both inputs must already be lowercased
fn score(query_lower: &str, candidate_lower: &str) -> f64 {
    if candidate_lower.contains(query_lower) {
        1.0
    } else {
        similarity_ratio(query_lower, candidate_lower)
    }
}

/// Ratcliff/Obershelp ratio: 2*M / (len(a) + len(b)), where M is the number of
/// chars covered by the recursively found longest common blocks.
///
/// Two empty strings are identical (1.0).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_chars(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Sum of the sizes of all matching blocks
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }

        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common block of a[alo..ahi] and b[blo..bhi] as (i, j, size).
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

    // run[x] = length of the common run ending at a[i-1], b[blo + x - 1]
    let width = bhi - blo + 1;
    let mut prev = vec![0usize; width];
    let mut cur = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let x = j - blo + 1;
            if a[i] == b[j] {
                let k = prev[x - 1] + 1;
                cur[x] = k;
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            } else {
                cur[x] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    (best_i, best_j, best_size)
}

// ============================================================================
// TESTS
// ============================================================================
