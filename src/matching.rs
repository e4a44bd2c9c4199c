//! Fuzzy matching primitives
//!
//! Similarity scoring and best-match selection for catalog resolution.
//! The scorer is a longest-matching-blocks ratio; the acceptance
//! cutoffs used by the resolver are tuned against this exact curve, so
//! it must not be swapped for an edit-distance metric.

use crate::error::{SyncError, SyncResult};
use std::collections::HashMap;

/// Similarity ratio between two strings, in [0.0, 1.0].
///
/// Finds the longest contiguous common substring, recurses on the
/// unmatched left and right remainders, and returns
/// `2 * matched / (len(a) + len(b))`. Symmetric and reflexive.
/// Two empty strings are treated as identical (1.0).
///
/// No case folding or whitespace normalization is applied; callers
/// compare exactly what they pass in.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let matched = matched_len(&a, 0, a.len(), &b, 0, b.len());
    2.0 * matched as f64 / (a.len() + b.len()) as f64
}

/// Total length of all matching blocks between `a[alo..ahi]` and
/// `b[blo..bhi]`.
fn matched_len(a: &[char], alo: usize, ahi: usize, b: &[char], blo: usize, bhi: usize) -> usize {
    let (i, j, k) = longest_match(a, alo, ahi, b, blo, bhi);
    if k == 0 {
        return 0;
    }
    k + matched_len(a, alo, i, b, blo, j) + matched_len(a, i + k, ahi, b, j + k, bhi)
}

/// Longest contiguous matching block within the given windows.
///
/// Returns `(i, j, k)` with `a[i..i+k] == b[j..j+k]`. Ties go to the
/// earliest block in `a`, then the earliest in `b`, which keeps the
/// recursion deterministic.
fn longest_match(
    a: &[char],
    alo: usize,
    ahi: usize,
    b: &[char],
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best_i = alo;
    let mut best_j = blo;
    let mut best_k = 0usize;

    // j2len[j] = length of the longest match ending at a[i], b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for i in alo..ahi {
        let mut row: HashMap<usize, usize> = HashMap::new();
        for j in blo..bhi {
            if b[j] != a[i] {
                continue;
            }
            let k = if j > blo {
                j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
            } else {
                1
            };
            row.insert(j, k);
            if k > best_k {
                best_i = i + 1 - k;
                best_j = j + 1 - k;
                best_k = k;
            }
        }
        j2len = row;
    }

    (best_i, best_j, best_k)
}

/// Select the highest-scoring candidate for a target string.
///
/// Scans the full list and returns `(score, index)`. Strict `>`
/// comparison means the first occurrence wins on ties. An empty
/// candidate list is a precondition failure, not a silent no-match.
pub fn select_best(target: &str, candidates: &[String]) -> SyncResult<(f64, usize)> {
    if candidates.is_empty() {
        return Err(SyncError::EmptyCandidates);
    }

    let mut best_ratio = 0.0;
    let mut best_idx = 0usize;

    for (idx, candidate) in candidates.iter().enumerate() {
        let ratio = similarity(target, candidate);
        if ratio > best_ratio {
            best_ratio = ratio;
            best_idx = idx;
        }
    }

    Ok((best_ratio, best_idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_reflexive() {
        assert_eq!(similarity("The Beatles Help!", "The Beatles Help!"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_similarity_symmetric() {
        let pairs = [
            ("abcdef", "abdcef"),
            ("The Beatles", "Beach Boys"),
            ("", "something"),
            ("Help!", "Yelp"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "asymmetric for {a:?}/{b:?}");
        }
    }

    #[test]
    fn test_similarity_bounds() {
        let pairs = [("abc", "xyz"), ("a", ""), ("abc", "abd"), ("long string", "l")];
        for (a, b) in pairs {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "out of bounds for {a:?}/{b:?}: {s}");
        }
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_similarity_matching_blocks_value() {
        // "ab" is the single 2-char common block: 2*2 / (3+3)
        let s = similarity("abc", "abd");
        assert!((s - 2.0 / 3.0).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn test_similarity_recurses_around_block() {
        // blocks "q" and "abcd" both match: 2*5 / (5+6)
        let s = similarity("qabcd", "qxabcd");
        assert!((s - 10.0 / 11.0).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn test_select_best_picks_highest() {
        let candidates = vec![
            "Beach Boys Surfin".to_string(),
            "The Beatles Help!".to_string(),
            "Bee Gees Tragedy".to_string(),
        ];
        let (score, idx) = select_best("The Beatles Help!", &candidates).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_select_best_tie_goes_to_first() {
        let candidates = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        // every candidate scores 0.0 against an unrelated target
        let (score, idx) = select_best("q", &candidates).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(score, 0.0);

        // equal non-zero scores as well
        let candidates = vec!["ab".to_string(), "ab".to_string()];
        let (score, idx) = select_best("ab", &candidates).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_select_best_empty_candidates_fails() {
        let result = select_best("anything", &[]);
        assert!(matches!(result, Err(SyncError::EmptyCandidates)));
    }
}
