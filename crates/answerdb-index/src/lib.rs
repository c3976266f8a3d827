//! Vector index over corpus questions: build, persist, nearest-match lookup
//! and the shared handle queries read through.

pub mod build;
pub mod error;
pub mod handle;
pub mod index;
pub mod matcher;
pub mod persist;

pub use build::{build, BuildReport};
pub use error::IndexError;
pub use handle::IndexHandle;
pub use index::{StoredVector, VectorIndex, UNKNOWN_EMBEDDER};
pub use matcher::{dot, find_best};
pub use persist::{from_bytes, load, save, to_bytes};
