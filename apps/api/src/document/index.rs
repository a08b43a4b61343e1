//! Ephemeral in-memory similarity index over one document's chunks.
//!
//! Built per tool call and dropped when the call returns. Every build
//! re-embeds every chunk; there is no cache keyed by document.

use std::cmp::Ordering;

use tracing::debug;

use crate::document::chunking::Chunk;
use crate::embeddings::{Embedder, EmbeddingError};

/// A chunk returned by a nearest-neighbour lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

pub struct SimilarityIndex<'e> {
    embedder: &'e dyn Embedder,
    entries: Vec<(Chunk, Vec<f32>)>,
    dimension: usize,
}

impl<'e> SimilarityIndex<'e> {
    /// Embeds every chunk in batches of the embedder's batch size.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &'e dyn Embedder,
    ) -> Result<Self, EmbeddingError> {
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(embedder.batch_size().max(1)) {
            let inputs: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embedded = embedder.embed(&inputs).await?;
            if embedded.len() != batch.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: batch.len(),
                    got: embedded.len(),
                });
            }
            vectors.extend(embedded);
        }

        let dimension = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                got: bad.len(),
            });
        }

        debug!(
            chunks = chunks.len(),
            dimension, "embedded every chunk for an ephemeral similarity index"
        );

        Ok(Self {
            embedder,
            entries: chunks.into_iter().zip(vectors).collect(),
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the `k` chunks most similar to `query`, best first.
    /// Asking for more chunks than exist returns all of them.
    pub async fn top_k(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk<'_>>, EmbeddingError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::CountMismatch {
                expected: 1,
                got: 0,
            })?;

        if query_vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                got: query_vector.len(),
            });
        }

        Ok(self.nearest(&query_vector, k))
    }

    /// Ranks every chunk against an already-embedded query.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<ScoredChunk<'_>> {
        let mut scored: Vec<ScoredChunk<'_>> = self
            .entries
            .iter()
            .map(|(chunk, vector)| ScoredChunk {
                chunk,
                score: cosine_similarity(query, vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.chunk.index.cmp(&b.chunk.index))
        });
        scored.truncate(k);
        scored
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
