use std::path::Path;
use std::sync::Arc;

use answerdb_core::config::Settings;
use answerdb_core::traits::Embedder;
use answerdb_core::types::{ExecutionResult, MatchResult};
use answerdb_exec::{Dispatcher, DispatcherConfig, ExecutionOutcome};
use answerdb_index::{find_best, BuildReport, IndexHandle, VectorIndex};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{QueryError, Result};
use crate::lifecycle::{build_and_save, load_or_build, IndexSources};

pub const NO_MATCH_MESSAGE: &str = "No matching solution found.";

/// Result of answering one question.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// A corpus question matched and its solution was dispatched. The outcome
    /// may itself be degraded (timeout, unsupported type, spawn failure).
    Solved { matched: MatchResult, outcome: ExecutionOutcome },
    /// Nothing to run: the index is empty or the nearest question has no
    /// solution script.
    NoMatch { nearest: Option<MatchResult> },
}

impl Answer {
    pub fn text(&self) -> String {
        match self {
            Answer::Solved { outcome, .. } => outcome.render(),
            Answer::NoMatch { .. } => NO_MATCH_MESSAGE.to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        match self {
            Answer::Solved { outcome, .. } => outcome.is_degraded(),
            Answer::NoMatch { .. } => false,
        }
    }

    /// The body returned to HTTP callers.
    pub fn to_result(&self) -> ExecutionResult {
        match self {
            Answer::Solved { outcome, .. } => outcome.to_result(),
            Answer::NoMatch { .. } => ExecutionResult::new(NO_MATCH_MESSAGE),
        }
    }
}

/// Question in, script output out.
///
/// Holds no per-query state: each call takes its own index snapshot, so
/// concurrent queries and a rebuild never observe a half-built index.
pub struct QueryService {
    index: IndexHandle,
    embedder: Arc<dyn Embedder>,
    dispatcher: Dispatcher,
    sources: IndexSources,
    rebuilding: Arc<Mutex<()>>,
}

impl QueryService {
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>, dispatcher: Dispatcher, sources: IndexSources) -> Self {
        Self { index: IndexHandle::new(index), embedder, dispatcher, sources, rebuilding: Arc::new(Mutex::new(())) }
    }

    /// Load or build the index described by `settings` and wire up the dispatcher.
    /// Blocking; call before the runtime starts serving.
    pub fn start(settings: &Settings, base: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let sources = IndexSources::from_settings(settings, base);
        let (index, report) = load_or_build(&sources, embedder.as_ref(), settings.index.rebuild_on_start)?;
        if let Some(report) = report {
            info!(indexed = report.indexed, skipped = report.skipped, "index built at startup");
        }
        let dispatcher = Dispatcher::new(DispatcherConfig::from(&settings.exec));
        Ok(Self::new(index, embedder, dispatcher, sources))
    }

    pub fn entries(&self) -> usize { self.index.snapshot().len() }

    pub fn snapshot(&self) -> Arc<VectorIndex> { self.index.snapshot() }

    pub fn sources(&self) -> &IndexSources { &self.sources }

    pub async fn answer(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        let embedder = Arc::clone(&self.embedder);
        let text = question.to_string();
        let query = tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await?
            .map_err(|e| QueryError::Embedding(format!("{:#}", e)))?;

        let best = {
            let snapshot = self.index.snapshot();
            find_best(&query, &snapshot)?
        };

        match best {
            Some(matched) => match matched.solution_reference.clone() {
                Some(script) => {
                    debug!(matched = %matched.matched_question, score = matched.score, script = %script.display(), "dispatching solution");
                    let outcome = self.dispatcher.execute(&script).await;
                    Ok(Answer::Solved { matched, outcome })
                }
                None => {
                    debug!(matched = %matched.matched_question, score = matched.score, "nearest question has no solution");
                    Ok(Answer::NoMatch { nearest: Some(matched) })
                }
            },
            None => Ok(Answer::NoMatch { nearest: None }),
        }
    }

    /// Rebuild from the corpus on the blocking pool, persist, then swap.
    /// Queries already running keep the index they started with. Concurrent
    /// rebuild requests run one after another.
    ///
    /// Save and swap happen together inside the blocking task, so a caller
    /// that stops waiting (client disconnect) still leaves the file and the
    /// served index in agreement.
    pub async fn rebuild(&self) -> Result<BuildReport> {
        let guard = Arc::clone(&self.rebuilding).lock_owned().await;
        let embedder = Arc::clone(&self.embedder);
        let sources = self.sources.clone();
        let handle = self.index.clone();
        let report = tokio::task::spawn_blocking(move || -> Result<BuildReport> {
            let _guard = guard;
            let (index, report) = build_and_save(&sources, embedder.as_ref())?;
            let previous = handle.swap(index);
            info!(indexed = report.indexed, skipped = report.skipped, replaced = previous.len(), "index rebuilt and swapped");
            Ok(report)
        })
        .await??;
        Ok(report)
    }
}
