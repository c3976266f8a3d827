use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use answerdb_core::corpus::Corpus;
use answerdb_core::traits::Embedder;

use crate::error::{IndexError, Result};
use crate::index::VectorIndex;

/// Counts from one index build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub indexed: usize,
    /// Questions dropped because the embedder failed on them.
    pub skipped: usize,
}

/// Embed every corpus question once and collect the vectors.
///
/// An embedder error or non-finite vector skips that question with a warning;
/// a vector of the wrong length aborts the build since it breaks the index
/// dimension invariant.
pub fn build(corpus: &Corpus, embedder: &dyn Embedder) -> Result<(VectorIndex, BuildReport)> {
    let mut index = VectorIndex::new(embedder.id(), embedder.dim());
    let mut report = BuildReport::default();
    info!(questions = corpus.len(), embedder = embedder.id(), "building vector index");

    let pb = ProgressBar::new(corpus.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions ({percent}%)") {
        pb.set_style(style.progress_chars("#>-"));
    }

    for (question, solution) in corpus.iter() {
        pb.inc(1);
        let embedding = match embedder.embed(question) {
            Ok(v) => v,
            Err(e) => {
                warn!(question, error = %e, "embedding failed, skipping question");
                report.skipped += 1;
                continue;
            }
        };
        if embedding.len() != embedder.dim() {
            pb.abandon();
            return Err(IndexError::DimensionMismatch { expected: embedder.dim(), actual: embedding.len() });
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            warn!(question, "embedding contains non-finite values, skipping question");
            report.skipped += 1;
            continue;
        }
        index.insert(question, embedding, solution.map(|p| p.to_path_buf()))?;
        report.indexed += 1;
    }

    pb.finish_and_clear();
    info!(indexed = report.indexed, skipped = report.skipped, "vector index built");
    Ok((index, report))
}
