use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

use answerdb_core::traits::Embedder;
use answerdb_core::types::CorpusEntry;

use crate::error::{IndexError, Result};

/// Embedder id recorded for indexes whose origin is not known (legacy files).
pub const UNKNOWN_EMBEDDER: &str = "unknown";

/// Embedding plus solution script for one question.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredVector {
    #[serde(deserialize_with = "narrow_to_f32")]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub solution_file: Option<PathBuf>,
}

/// Question text → stored vector, in insertion order, plus the identity of
/// the embedder that produced every vector.
///
/// Immutable once built; a rebuilt index replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    embedder_id: String,
    dimension: usize,
    built_at: DateTime<Utc>,
    entries: IndexMap<String, StoredVector>,
}

impl VectorIndex {
    pub fn new(embedder_id: impl Into<String>, dimension: usize) -> Self {
        Self { embedder_id: embedder_id.into(), dimension, built_at: Utc::now(), entries: IndexMap::new() }
    }

    pub(crate) fn from_parts(
        embedder_id: String,
        dimension: usize,
        built_at: DateTime<Utc>,
        entries: IndexMap<String, StoredVector>,
    ) -> Result<Self> {
        for (question, stored) in &entries {
            if stored.embedding.len() != dimension {
                return Err(IndexError::Corrupt(format!(
                    "entry {:?} has {} dims, header says {}",
                    question,
                    stored.embedding.len(),
                    dimension
                )));
            }
        }
        Ok(Self { embedder_id, dimension, built_at, entries })
    }

    /// Insert or replace the entry for `question`.
    pub fn insert(&mut self, question: impl Into<String>, embedding: Vec<f32>, solution_file: Option<PathBuf>) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(IndexError::DimensionMismatch { expected: self.dimension, actual: embedding.len() });
        }
        self.entries.insert(question.into(), StoredVector { embedding, solution_file });
        Ok(())
    }

    pub fn embedder_id(&self) -> &str { &self.embedder_id }

    pub fn dimension(&self) -> usize { self.dimension }

    pub fn built_at(&self) -> DateTime<Utc> { self.built_at }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, question: &str) -> Option<CorpusEntry<'_>> {
        self.entries.get_key_value(question).map(|(q, s)| entry_view(q, s))
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = CorpusEntry<'_>> {
        self.entries.iter().map(|(q, s)| entry_view(q, s))
    }

    pub(crate) fn stored(&self) -> &IndexMap<String, StoredVector> { &self.entries }

    /// Whether vectors in this index are comparable with `embedder`'s output.
    /// Legacy indexes carry no embedder id, so only the dimension is checked.
    pub fn is_compatible_with(&self, embedder: &dyn Embedder) -> bool {
        let id_ok = self.embedder_id == UNKNOWN_EMBEDDER || self.embedder_id == embedder.id();
        let dim_ok = self.is_empty() || self.dimension == embedder.dim();
        id_ok && dim_ok
    }
}

fn entry_view<'a>(question: &'a str, stored: &'a StoredVector) -> CorpusEntry<'a> {
    CorpusEntry {
        question,
        embedding: &stored.embedding,
        solution_reference: stored.solution_file.as_deref(),
    }
}

/// Parse as f64 and narrow once, so values written from f32 come back
/// bit-identical instead of going through a second decimal rounding.
fn narrow_to_f32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<f32>, D::Error> {
    let wide = Vec::<f64>::deserialize(deserializer)?;
    Ok(wide.into_iter().map(|x| x as f32).collect())
}
