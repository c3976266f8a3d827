//! On-disk index format.
//!
//! Current format (JSON):
//!
//! ```json
//! { "format": 1, "embedder_id": "...", "dimension": 384, "built_at": "...",
//!   "entries": { "<question>": { "embedding": [..], "solution_file": "GA1/q.py" } } }
//! ```
//!
//! The bare `{ "<question>": { "embedding", "solution_file" } }` map written by
//! earlier deployments is still accepted on load.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{IndexError, Result};
use crate::index::{StoredVector, VectorIndex, UNKNOWN_EMBEDDER};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct IndexFileRef<'a> {
    format: u32,
    embedder_id: &'a str,
    dimension: usize,
    built_at: DateTime<Utc>,
    entries: IndexMap<&'a str, WideVector<'a>>,
}

/// Embeddings are written widened to f64: every f32 is exactly representable,
/// so the value read back is bit-identical.
#[derive(Serialize)]
struct WideVector<'a> {
    embedding: Vec<f64>,
    solution_file: Option<&'a Path>,
}

#[derive(Deserialize)]
struct IndexFile {
    format: u32,
    embedder_id: String,
    dimension: usize,
    built_at: DateTime<Utc>,
    entries: IndexMap<String, StoredVector>,
}

pub fn to_bytes(index: &VectorIndex) -> Result<Vec<u8>> {
    let entries = index
        .stored()
        .iter()
        .map(|(q, s)| {
            let wide = WideVector {
                embedding: s.embedding.iter().map(|&x| f64::from(x)).collect(),
                solution_file: s.solution_file.as_deref(),
            };
            (q.as_str(), wide)
        })
        .collect();
    let file = IndexFileRef {
        format: FORMAT_VERSION,
        embedder_id: index.embedder_id(),
        dimension: index.dimension(),
        built_at: index.built_at(),
        entries,
    };
    Ok(serde_json::to_vec_pretty(&file)?)
}

pub fn from_bytes(bytes: &[u8]) -> Result<VectorIndex> {
    match serde_json::from_slice::<IndexFile>(bytes) {
        Ok(file) => {
            if file.format != FORMAT_VERSION {
                return Err(IndexError::Corrupt(format!("unsupported index format {}", file.format)));
            }
            VectorIndex::from_parts(file.embedder_id, file.dimension, file.built_at, file.entries)
        }
        Err(current_err) => match serde_json::from_slice::<IndexMap<String, StoredVector>>(bytes) {
            Ok(entries) => {
                let dimension = entries.values().next().map_or(0, |s| s.embedding.len());
                debug!(entries = entries.len(), dimension, "loaded legacy index layout");
                VectorIndex::from_parts(UNKNOWN_EMBEDDER.to_string(), dimension, Utc::now(), entries)
            }
            Err(_) => Err(IndexError::Serialization(current_err)),
        },
    }
}

/// Write via a temp file in the same directory and rename, so readers of
/// `path` never see a half-written index.
pub fn save(index: &VectorIndex, path: &Path) -> Result<()> {
    let io_err = |source| IndexError::Io { path: path.to_path_buf(), source };
    let bytes = to_bytes(index)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    info!(path = %path.display(), entries = index.len(), bytes = bytes.len(), "index saved");
    Ok(())
}

pub fn load(path: &Path) -> Result<VectorIndex> {
    let bytes = fs::read(path).map_err(|source| IndexError::Io { path: path.to_path_buf(), source })?;
    let index = from_bytes(&bytes)?;
    info!(path = %path.display(), entries = index.len(), embedder = index.embedder_id(), "index loaded");
    Ok(index)
}
