use std::cmp::Ordering;

use thiserror::Error;

/// Candidates scoring below this are never sent to the model.
pub const SIMILARITY_THRESHOLD: f32 = 0.6;
/// At most this many documents make it into the prompt.
pub const TOP_K: usize = 3;

#[derive(Error, Debug, PartialEq)]
pub enum RetrievalError {
    #[error("vectors cannot be empty")]
    EmptyVector,
    #[error("vector length mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// A candidate together with its cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub item: T,
    pub similarity: f32,
}

/// Cosine similarity of two equal-length vectors.
///
/// A zero-magnitude vector yields 0.0 rather than dividing by zero. Empty or
/// mismatched-length inputs are rejected before any computation.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, RetrievalError> {
    if a.is_empty() || b.is_empty() {
        return Err(RetrievalError::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(RetrievalError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

/// Score every candidate against the query, keep those at or above the
/// similarity threshold, and return at most the top K ordered best-first.
///
/// Pure over its inputs; the first malformed candidate vector aborts ranking.
pub fn rank_by_similarity<T>(
    query: &[f32],
    candidates: Vec<(T, Vec<f32>)>,
) -> Result<Vec<Ranked<T>>, RetrievalError> {
    let mut ranked = Vec::new();

    for (item, vector) in candidates {
        let similarity = cosine_similarity(query, &vector)?;
        if similarity >= SIMILARITY_THRESHOLD {
            ranked.push(Ranked { item, similarity });
        }
    }

    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(TOP_K);

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let a = vec![1.0, 2.0, 3.0];
        let score = cosine_similarity(&a, &a).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero_instead_of_erroring() {
        let zero = vec![0.0, 0.0, 0.0];
        let other = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &other).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&other, &zero).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(
            cosine_similarity(&a, &b),
            Err(RetrievalError::DimensionMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn empty_vectors_are_rejected() {
        assert_eq!(
            cosine_similarity(&[], &[1.0]),
            Err(RetrievalError::EmptyVector)
        );
    }

    // Candidates built so their similarity to the unit query is exactly the
    // first component: (s, sqrt(1 - s^2)) against (1, 0).
    fn candidate(name: &str, s: f32) -> (String, Vec<f32>) {
        (name.to_string(), vec![s, (1.0 - s * s).sqrt()])
    }

    #[test]
    fn ranking_filters_sorts_and_caps() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            candidate("a", 0.9),
            candidate("b", 0.3),
            candidate("c", 0.7),
            candidate("d", 0.65),
        ];

        let ranked = rank_by_similarity(&query, candidates).unwrap();
        let names: Vec<&str> = ranked.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d"]);

        for pair in ranked.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        for r in &ranked {
            assert!(r.similarity >= SIMILARITY_THRESHOLD);
        }
    }

    #[test]
    fn ranking_returns_at_most_top_k() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            candidate("a", 0.99),
            candidate("b", 0.95),
            candidate("c", 0.9),
            candidate("d", 0.85),
            candidate("e", 0.8),
        ];

        let ranked = rank_by_similarity(&query, candidates).unwrap();
        assert_eq!(ranked.len(), TOP_K);
        let names: Vec<&str> = ranked.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn below_threshold_candidates_never_appear() {
        let query = vec![1.0, 0.0];
        let candidates = vec![candidate("low", 0.2), candidate("lower", 0.5)];
        let ranked = rank_by_similarity(&query, candidates).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn ranking_propagates_dimension_errors() {
        let query = vec![1.0, 0.0];
        let candidates = vec![("bad".to_string(), vec![1.0, 0.0, 0.0])];
        assert!(rank_by_similarity(&query, candidates).is_err());
    }
}
