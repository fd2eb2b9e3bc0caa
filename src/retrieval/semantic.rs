//! Semantic ranking over precomputed chunk embeddings

use crate::storage::{ArticleChunk, ArticleId};
use serde::Serialize;

/// A chunk scored against the expanded query set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticHit {
    pub article_id: ArticleId,
    pub title: String,
    pub text: String,
    pub similarity: f32,
}

/// Cosine similarity, `None` for zero-norm vectors or mismatched lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    Some((dot / denom).clamp(-1.0, 1.0))
}

/// Score every chunk by its best match across `query_vectors`
///
/// Scores start at zero, so a chunk that only anti-correlates still scores
/// 0. Chunks no query vector can be compared with are left out. The sort is
/// stable, so ties keep corpus order.
pub fn semantic_rank(
    chunks: &[ArticleChunk],
    query_vectors: &[Vec<f32>],
    top_k: usize,
) -> Vec<SemanticHit> {
    if query_vectors.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let mut hits: Vec<SemanticHit> = chunks
        .iter()
        .filter_map(|chunk| {
            let best = query_vectors
                .iter()
                .filter_map(|q| cosine_similarity(q, &chunk.embedding))
                .fold(None, |acc: Option<f32>, s| Some(acc.unwrap_or(0.0).max(s)))?;

            Some(SemanticHit {
                article_id: chunk.article_id.clone(),
                title: chunk.title.clone(),
                text: chunk.text.clone(),
                similarity: best,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    hits.truncate(top_k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: u64, article: &str, embedding: Vec<f32>) -> ArticleChunk {
        ArticleChunk {
            chunk_id: id,
            article_id: ArticleId::from(article),
            title: format!("Article {}", article),
            chunk_index: 0,
            text: format!("chunk {}", id),
            embedding,
        }
    }

    #[test]
    fn test_cosine_identical_and_opposite() {
        let v = vec![0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-6);

        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        assert!((cosine_similarity(&v, &neg).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_fails_closed() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
    }

    #[test]
    fn test_rank_uses_best_query() {
        let chunks = vec![
            chunk(0, "a", vec![1.0, 0.0]),
            chunk(1, "b", vec![0.0, 1.0]),
            chunk(2, "c", vec![0.7, 0.7]),
        ];
        let queries = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let hits = semantic_rank(&chunks, &queries, 3);

        // a and b each match one query exactly
        assert_eq!(hits.len(), 3);
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
        assert!((hits[1].similarity - 1.0).abs() < 1e-6);
        assert_eq!(hits[2].article_id.as_str(), "c");
    }

    #[test]
    fn test_rank_sorted_and_bounded() {
        let chunks: Vec<ArticleChunk> = (0..20)
            .map(|i| chunk(i, &i.to_string(), vec![1.0, i as f32 * 0.37 - 3.0, (i % 3) as f32]))
            .collect();
        let queries = vec![vec![0.5, -1.0, 2.0], vec![-1.0, 0.2, 0.0]];

        let hits = semantic_rank(&chunks, &queries, 7);

        assert_eq!(hits.len(), 7);
        for pair in hits.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        for hit in &hits {
            assert!((0.0..=1.0).contains(&hit.similarity));
        }
    }

    #[test]
    fn test_rank_excludes_uncomparable_chunks() {
        let chunks = vec![chunk(0, "zero", vec![0.0, 0.0]), chunk(1, "ok", vec![1.0, 1.0])];

        let hits = semantic_rank(&chunks, &[vec![1.0, 0.0]], 5);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].article_id.as_str(), "ok");
    }

    #[test]
    fn test_rank_without_queries_is_empty() {
        let chunks = vec![chunk(0, "a", vec![1.0])];
        assert!(semantic_rank(&chunks, &[], 5).is_empty());
    }
}
