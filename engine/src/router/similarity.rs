//! Embedding similarity scoring for `embedding.route` (spec §4.6).

/// Cosine similarity between two equal-length vectors; `0.0` if either is
/// empty or their lengths differ (callers treat that as "no match").
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Pick the candidate with the highest cosine similarity to `query`.
/// Returns `(assistant_key, score)`; `None` when `candidates` is empty.
#[must_use]
pub fn best_candidate<'a>(query: &[f32], candidates: &'a [(String, Vec<f32>)]) -> Option<(&'a str, f32)> {
    candidates
        .iter()
        .map(|(key, vector)| (key.as_str(), cosine_similarity(query, vector)))
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_maximally_similar() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn best_candidate_picks_highest_score() {
        let candidates = vec![
            ("a".to_string(), vec![0.0, 1.0]),
            ("b".to_string(), vec![1.0, 0.0]),
        ];
        let (key, score) = best_candidate(&[1.0, 0.0], &candidates).unwrap();
        assert_eq!(key, "b");
        assert!(score > 0.9);
    }

    #[test]
    fn empty_candidates_yields_none() {
        assert!(best_candidate(&[1.0], &[]).is_none());
    }
}
