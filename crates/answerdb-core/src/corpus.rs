//! Question/solution discovery over a corpus checkout.
//!
//! A corpus root contains named folders; inside them every `<base>.<question_ext>`
//! file is a question and an optional sibling `<base>.<solution_ext>` is its
//! solution script.

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::CorpusSettings;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct CorpusLayout {
    pub folders: Vec<String>,
    pub question_extension: String,
    pub solution_extensions: Vec<String>,
}

impl Default for CorpusLayout {
    fn default() -> Self {
        Self::from(&CorpusSettings::default())
    }
}

impl From<&CorpusSettings> for CorpusLayout {
    fn from(settings: &CorpusSettings) -> Self {
        let strip = |ext: &String| ext.trim_start_matches('.').to_string();
        Self {
            folders: settings.folders.clone(),
            question_extension: strip(&settings.question_extension),
            solution_extensions: settings.solution_extensions.iter().map(strip).collect(),
        }
    }
}

/// Questions mapped to their (optional) solution script, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: IndexMap<String, Option<PathBuf>>,
    skipped: usize,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    /// Last write wins: a repeated question replaces the earlier solution but
    /// keeps its original position.
    pub fn insert(&mut self, question: String, solution: Option<PathBuf>) {
        if let Some(previous) = self.entries.insert(question, solution) {
            debug!(?previous, "duplicate question replaced");
        }
    }

    pub fn get(&self, question: &str) -> Option<Option<&Path>> {
        self.entries.get(question).map(Option::as_deref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Path>)> {
        self.entries.iter().map(|(q, s)| (q.as_str(), s.as_deref()))
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Question files that were found but could not be used.
    pub fn skipped(&self) -> usize { self.skipped }
}

#[derive(Debug, Clone, Default)]
pub struct CorpusExtractor {
    layout: CorpusLayout,
}

impl CorpusExtractor {
    pub fn new(layout: CorpusLayout) -> Self { Self { layout } }

    pub fn layout(&self) -> &CorpusLayout { &self.layout }

    /// Walk every configured folder under `root` and collect questions.
    ///
    /// Missing folders and unreadable question files are skipped with a
    /// warning; only a missing root or an unusable layout is an error.
    pub fn extract(&self, root: &Path) -> Result<Corpus> {
        self.validate()?;
        if !root.is_dir() {
            return Err(Error::RootNotFound(root.to_path_buf()));
        }
        let mut corpus = Corpus::new();
        for folder in &self.layout.folders {
            let folder_path = root.join(folder);
            if !folder_path.is_dir() {
                warn!(folder = %folder_path.display(), "corpus folder missing, skipping");
                continue;
            }
            let files = self.list_question_files(&folder_path);
            debug!(folder = %folder, count = files.len(), "scanning corpus folder");
            for file_path in files {
                match self.read_question(&file_path) {
                    Some(question) => {
                        let solution = self.find_solution(&file_path);
                        corpus.insert(question, solution);
                    }
                    None => corpus.skipped += 1,
                }
            }
        }
        info!(questions = corpus.len(), skipped = corpus.skipped, root = %root.display(), "corpus extracted");
        Ok(corpus)
    }

    fn validate(&self) -> Result<()> {
        if self.layout.question_extension.is_empty() {
            return Err(Error::InvalidLayout("question extension is empty".to_string()));
        }
        if self.layout.solution_extensions.iter().any(|e| *e == self.layout.question_extension) {
            return Err(Error::InvalidLayout(format!(
                "solution extensions must not include the question extension '{}'",
                self.layout.question_extension
            )));
        }
        Ok(())
    }

    fn read_question(&self, file_path: &Path) -> Option<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => {
                let question = content.trim();
                if question.is_empty() {
                    warn!(file = %file_path.display(), "empty question file, skipping");
                    return None;
                }
                Some(question.to_string())
            }
            Err(e) => {
                warn!(file = %file_path.display(), error = %e, "unreadable question file, skipping");
                None
            }
        }
    }

    fn find_solution(&self, question_path: &Path) -> Option<PathBuf> {
        self.layout
            .solution_extensions
            .iter()
            .map(|ext| question_path.with_extension(ext))
            .find(|candidate| candidate.is_file())
    }

    fn list_question_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut question_files = Vec::new();
        let walker = walkdir::WalkDir::new(root).sort_by_file_name().into_iter();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => { warn!(error = %e, "corpus walk error, skipping entry"); continue; }
            };
            if !entry.file_type().is_file() { continue; }
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some(self.layout.question_extension.as_str()) {
                question_files.push(path.to_path_buf());
            }
        }
        question_files
    }
}
