//! Test utilities for exercising storage failure paths.

use crate::memory::MemoryDataStore;

/// Forces every commit on the wrapped store to fail for the guard's
/// lifetime. Restores normal behavior on drop so a panicking test cannot
/// poison a shared store.
pub struct CommitFailGuard<'a> {
    store: &'a MemoryDataStore,
}

impl<'a> CommitFailGuard<'a> {
    pub fn new(store: &'a MemoryDataStore) -> Self {
        store.set_fail_commits(true);
        Self { store }
    }
}

impl Drop for CommitFailGuard<'_> {
    fn drop(&mut self) {
        self.store.set_fail_commits(false);
    }
}
