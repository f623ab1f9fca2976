//! Near-duplicate detection for cumulative context entries
//!
//! Decides whether a freshly generated context entry is a rerun of the
//! most recent stored entry and should not be appended again. Two texts
//! count as similar when one nearly contains the other or their character
//! trigram overlap clears [`SIMILARITY_THRESHOLD`]. A carve-out keeps
//! distinct retrievals apart: entries tagged with different embedded
//! timestamps or different search queries are never similar, no matter
//! how much their payloads overlap.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Ratio above which two texts are considered the same retrieval
pub const SIMILARITY_THRESHOLD: f64 = 0.90;

/// Matches the timestamp inside an embedded entry delimiter
fn entry_timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"--- CONTEXT ENTRY \(([^)]+)\) ---").unwrap())
}

/// Matches the query marker in an empty-result context text
fn query_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"for query: '([^']*)'").unwrap())
}

/// Similarity with the distinct-retrieval carve-out applied first.
///
/// This is the check the cumulative-context engine uses before
/// deduplicating an append.
pub fn is_similar_entry(previous: &str, candidate: &str) -> bool {
    if previous.is_empty() || candidate.is_empty() {
        return false;
    }

    // Different embedded retrieval timestamps mean different searches.
    let stamps_prev = last_embedded_timestamp(previous);
    let stamps_cand = last_embedded_timestamp(candidate);
    if let (Some(a), Some(b)) = (&stamps_prev, &stamps_cand) {
        if a != b {
            return false;
        }
    }

    // Different search queries mean different retrievals even when the
    // surrounding text is near-identical.
    let query_prev = embedded_query(previous);
    let query_cand = embedded_query(candidate);
    if let (Some(a), Some(b)) = (&query_prev, &query_cand) {
        if a != b {
            return false;
        }
    }

    is_similar(previous, candidate)
}

/// Plain textual similarity: near-containment or trigram overlap above
/// the threshold on comparably sized texts.
pub fn is_similar(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let a_norm = a.trim().to_lowercase();
    let b_norm = b.trim().to_lowercase();

    if a_norm == b_norm {
        return true;
    }

    let (shorter, longer) = if a_norm.len() <= b_norm.len() {
        (&a_norm, &b_norm)
    } else {
        (&b_norm, &a_norm)
    };
    if longer.is_empty() {
        return false;
    }

    let length_ratio = shorter.len() as f64 / longer.len() as f64;

    if length_ratio >= SIMILARITY_THRESHOLD && longer.contains(shorter.as_str()) {
        return true;
    }

    // Trigram overlap only applies to comparable lengths; a short text
    // embedded in a long one is handled by containment above.
    if length_ratio >= SIMILARITY_THRESHOLD {
        return trigram_jaccard(&a_norm, &b_norm) > SIMILARITY_THRESHOLD;
    }

    false
}

fn last_embedded_timestamp(text: &str) -> Option<String> {
    entry_timestamp_regex()
        .captures_iter(text)
        .last()
        .map(|c| c[1].to_string())
}

fn embedded_query(text: &str) -> Option<String> {
    query_marker_regex()
        .captures(text)
        .map(|c| c[1].to_string())
}

/// Jaccard index over character trigrams
fn trigram_jaccard(a: &str, b: &str) -> f64 {
    let grams_a = trigrams(a);
    let grams_b = trigrams(b);
    if grams_a.is_empty() || grams_b.is_empty() {
        return 0.0;
    }

    let intersection = grams_a.intersection(&grams_b).count();
    let union = grams_a.union(&grams_b).count();
    if union == 0 {
        return 0.0;
    }

    intersection as f64 / union as f64
}

fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_is_similar() {
        assert!(is_similar("Node: Alice\nSummary: Admin", "Node: Alice\nSummary: Admin"));
        assert!(is_similar("  padded  ", "padded"));
    }

    #[test]
    fn test_empty_never_similar() {
        assert!(!is_similar("", "something"));
        assert!(!is_similar("something", ""));
        assert!(!is_similar_entry("", ""));
    }

    #[test]
    fn test_near_containment() {
        let long = "Relevant Entities from Knowledge Graph:\nNode: Alice\nSummary: Site reliability lead for the data platform team";
        // Drop a short suffix: still >= 90% of the longer text
        let short = &long[..long.len() - 5];
        assert!(is_similar(long, short));
    }

    #[test]
    fn test_short_fragment_not_similar() {
        let long = "Relevant Entities from Knowledge Graph:\nNode: Alice\nSummary: Site reliability lead for the data platform team";
        assert!(!is_similar(long, "Node: Alice"));
    }

    #[test]
    fn test_distinct_content_not_similar() {
        let a = "Relevant Entities from Knowledge Graph:\nNode: Payments\nSummary: Handles card settlement and refunds";
        let b = "Relevant Entities from Knowledge Graph:\nNode: Weather\nSummary: Forecast ingestion from public radar feeds";
        assert!(!is_similar(a, b));
    }

    #[test]
    fn test_different_embedded_timestamps_not_similar() {
        let a = "--- CONTEXT ENTRY (2025-01-01 10:00:00 UTC) ---\n\nRelevant Entities from Knowledge Graph:\nNode: A";
        let b = "--- CONTEXT ENTRY (2025-01-01 10:05:00 UTC) ---\n\nRelevant Entities from Knowledge Graph:\nNode: A";
        assert!(!is_similar_entry(a, b));
    }

    #[test]
    fn test_same_embedded_timestamp_falls_through() {
        let a = "--- CONTEXT ENTRY (2025-01-01 10:00:00 UTC) ---\n\nRelevant Entities from Knowledge Graph:\nNode: A";
        assert!(is_similar_entry(a, a));
    }

    #[test]
    fn test_different_queries_not_similar() {
        let body = "Relevant Entities from Knowledge Graph:\nNode: Incident Review\nSummary: Weekly review of production incidents across the platform, covering root causes, remediation owners, and follow-up deadlines for every open action item";
        let a = format!("{body}\nNo relevant information found in the knowledge graph for query: 'alpha' (searched 8 nodes, 20 facts)");
        let b = format!("{body}\nNo relevant information found in the knowledge graph for query: 'omega' (searched 8 nodes, 20 facts)");
        // The texts are nearly identical, but the queries differ
        assert!(is_similar(&a, &b));
        assert!(!is_similar_entry(&a, &b));
    }

    #[test]
    fn test_same_query_is_similar() {
        let a = "No relevant information found in the knowledge graph for query: 'alpha' (searched 8 nodes, 20 facts)";
        assert!(is_similar_entry(a, a));
    }

    #[test]
    fn test_trigram_overlap_on_comparable_length() {
        let a = "Fact: the deploy pipeline gates on integration tests before rollout";
        let b = "Fact: the deploy pipeline gates on integration tests before rollout.";
        assert!(is_similar(a, b));
    }
}
