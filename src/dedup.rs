//! Near-duplicate detection over flat string lists
//!
//! Used to spot almost-identical artist or album spellings in exported
//! metadata lists before they pollute resolution.

use crate::error::SyncResult;
use crate::matching::similarity;
use std::path::Path;
use tracing::info;

/// A pair of near-duplicate corpus entries, canonical form `index_a < index_b`
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicatePair {
    pub index_a: usize,
    pub index_b: usize,
    pub score: f64,
}

/// Compare every unordered pair of the corpus and report pairs scoring
/// strictly above `threshold`.
///
/// Naive O(n²) scan; intended corpus sizes are metadata lists, not full
/// libraries. Pairs are emitted in iteration order (i ascending, then j
/// ascending). A corpus with fewer than two entries yields no pairs.
pub fn find_duplicates(corpus: &[String], threshold: f64) -> Vec<DuplicatePair> {
    let mut pairs = Vec::new();

    for i in 0..corpus.len().saturating_sub(1) {
        for j in (i + 1)..corpus.len() {
            let score = similarity(&corpus[i], &corpus[j]);
            if score > threshold {
                pairs.push(DuplicatePair {
                    index_a: i,
                    index_b: j,
                    score,
                });
            }
        }
    }

    pairs
}

/// Run duplicate detection over a text file, one entry per line.
///
/// Logs each match and returns the pairs together with the corpus so
/// callers can print or post-process them.
pub fn analyze_file(path: &Path, threshold: f64) -> SyncResult<(Vec<String>, Vec<DuplicatePair>)> {
    let content = std::fs::read_to_string(path)?;
    let corpus: Vec<String> = content.lines().map(|l| l.to_string()).collect();

    info!("🔍 Analyzing {} entries from {}", corpus.len(), path.display());

    let pairs = find_duplicates(&corpus, threshold);
    for pair in &pairs {
        info!(
            "[MATCH]: {} <--> {} ({:.3})",
            corpus[pair.index_a], corpus[pair.index_b], pair.score
        );
    }

    Ok((corpus, pairs))
}
