use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

/// Names of tapes not yet replayed during this run.
///
/// Seeded once with every known tape. Afterwards entries can only be
/// removed, so the set never grows.
#[derive(Debug, Clone, Default)]
pub struct UnusedTapes {
    names: Arc<RwLock<HashSet<String>>>,
}

impl UnusedTapes {
    /// Create a set holding all the given tape names.
    pub fn seeded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Arc::new(RwLock::new(names.into_iter().map(Into::into).collect())),
        }
    }

    /// Mark a tape as used. Returns whether it was still unused.
    pub fn remove(&self, name: &str) -> bool {
        self.names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted snapshot of the remaining names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
