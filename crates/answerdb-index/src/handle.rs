use std::sync::{Arc, PoisonError, RwLock};

use crate::index::VectorIndex;

/// Process-wide, swappable reference to the current index.
///
/// Readers take an `Arc` snapshot and keep using it for the whole query; a
/// rebuild installs a complete new index in one write. The lock is only held
/// long enough to clone or replace the `Arc`.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    current: Arc<RwLock<Arc<VectorIndex>>>,
}

impl IndexHandle {
    pub fn new(index: VectorIndex) -> Self {
        Self { current: Arc::new(RwLock::new(Arc::new(index))) }
    }

    pub fn snapshot(&self) -> Arc<VectorIndex> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Install `index` and return the one it replaced.
    pub fn swap(&self, index: VectorIndex) -> Arc<VectorIndex> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(index))
    }
}
