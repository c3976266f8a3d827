//! Nearest-question lookup.
//!
//! Exhaustive scan: every query is compared with every stored vector, O(N·D).
//! That is fine for corpora of a few hundred questions; past that this is the
//! first thing to replace with an ANN structure.
//!
//! Similarity is the raw dot product. It equals cosine similarity only when the
//! embedder emits unit-length vectors (both bundled embedders do); an embedder
//! that does not will bias matches toward long vectors.

use answerdb_core::types::{CorpusEntry, MatchResult};

use crate::error::{IndexError, Result};
use crate::index::VectorIndex;

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Best-scoring entry for `query`, or `None` when the index is empty.
///
/// Ties go to the entry inserted first. A query whose length differs from the
/// index dimension is an error, never a truncated comparison.
pub fn find_best(query: &[f32], index: &VectorIndex) -> Result<Option<MatchResult>> {
    if index.is_empty() {
        return Ok(None);
    }
    if query.len() != index.dimension() {
        return Err(IndexError::DimensionMismatch { expected: index.dimension(), actual: query.len() });
    }

    let mut best: Option<(f32, CorpusEntry<'_>)> = None;
    for entry in index.entries() {
        let score = dot(query, entry.embedding);
        if score.is_nan() { continue; }
        match best {
            Some((best_score, _)) if score <= best_score => {}
            _ => best = Some((score, entry)),
        }
    }

    Ok(best.map(|(score, entry)| MatchResult {
        matched_question: entry.question.to_string(),
        score,
        solution_reference: entry.solution_reference.map(|p| p.to_path_buf()),
    }))
}
