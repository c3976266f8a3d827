//! Domain types shared by the index, dispatcher and query service.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A stored (question, embedding, solution reference) triple, borrowed from
/// the index that owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorpusEntry<'a> {
    pub question: &'a str,
    pub embedding: &'a [f32],
    pub solution_reference: Option<&'a Path>,
}

/// One inbound question, as posted by a form. The field is optional here so
/// a missing question can be answered with a client error instead of a
/// decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub question: Option<String>,
}

/// The nearest corpus entry for a query.
///
/// `score` is the raw dot product between query and stored embedding;
/// higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched_question: String,
    pub score: f32,
    pub solution_reference: Option<PathBuf>,
}

/// Text handed back to the caller. Serialized as `{"answer": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(rename = "answer")]
    pub output_text: String,
}

impl ExecutionResult {
    pub fn new(output_text: impl Into<String>) -> Self {
        Self { output_text: output_text.into() }
    }
}
