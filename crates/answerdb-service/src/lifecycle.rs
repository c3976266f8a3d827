//! Where the index comes from: a persisted file when one is usable, otherwise
//! a fresh build from the corpus tree.

use std::path::{Path, PathBuf};

use answerdb_core::config::{resolve_with_base, Settings};
use answerdb_core::corpus::{CorpusExtractor, CorpusLayout};
use answerdb_core::traits::Embedder;
use answerdb_index::{build, load, save, BuildReport, VectorIndex};
use tracing::{debug, warn};

use crate::error::Result;

/// Corpus location and layout plus the file the built index is saved to.
#[derive(Debug, Clone)]
pub struct IndexSources {
    pub corpus_root: PathBuf,
    pub layout: CorpusLayout,
    pub index_path: PathBuf,
}

impl IndexSources {
    /// Relative paths in `settings` are resolved against `base`.
    pub fn from_settings(settings: &Settings, base: &Path) -> Self {
        Self {
            corpus_root: resolve_with_base(base, &settings.corpus.root),
            layout: CorpusLayout::from(&settings.corpus),
            index_path: resolve_with_base(base, &settings.index.path),
        }
    }
}

/// Extract the corpus, embed it and write the result to `index_path`.
pub fn build_and_save(sources: &IndexSources, embedder: &dyn Embedder) -> Result<(VectorIndex, BuildReport)> {
    let corpus = CorpusExtractor::new(sources.layout.clone()).extract(&sources.corpus_root)?;
    let (index, mut report) = build(&corpus, embedder)?;
    report.skipped += corpus.skipped();
    save(&index, &sources.index_path)?;
    Ok((index, report))
}

/// Load the persisted index, or build one when it is missing, unreadable,
/// made by a different embedder, or `force_rebuild` is set.
///
/// Returns the build report only when a build happened.
pub fn load_or_build(
    sources: &IndexSources,
    embedder: &dyn Embedder,
    force_rebuild: bool,
) -> Result<(VectorIndex, Option<BuildReport>)> {
    if !force_rebuild && sources.index_path.exists() {
        match load(&sources.index_path) {
            Ok(index) if index.is_compatible_with(embedder) => {
                debug!(embedder = index.embedder_id(), "persisted index is compatible, reusing");
                return Ok((index, None));
            }
            Ok(index) => warn!(
                stored = index.embedder_id(),
                stored_dim = index.dimension(),
                current = embedder.id(),
                "persisted index was built by a different embedder, rebuilding"
            ),
            Err(e) => warn!(path = %sources.index_path.display(), error = %e, "persisted index unusable, rebuilding"),
        }
    }
    let (index, report) = build_and_save(sources, embedder)?;
    Ok((index, Some(report)))
}
