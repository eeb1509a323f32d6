// SPDX-License-Identifier: MIT

//! Resource Lock Manager (spec §4.D). Serializes concurrent tasks that
//! declare overlapping `write_files`. Locks for one request are always
//! acquired in sorted path order and released in the reverse order, which
//! prevents the classic two-task circular wait even when request sets
//! overlap only partially.

use crate::error::LockError;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

/// Holds one lock per path for as long as it is alive. Dropping it (or
/// calling `unlock_all` explicitly) releases every path, in the reverse
/// order they were acquired.
pub struct LockGuard {
    guards: Vec<OwnedMutexGuard<()>>,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        while self.guards.pop().is_some() {}
    }
}

/// Per-path mutex table. Entries are never removed — a run touches a
/// bounded set of repository paths, so this does not grow unbounded in
/// practice.
#[derive(Default)]
pub struct ResourceLockManager {
    locks: SyncMutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ResourceLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire every distinct path in `paths`, sorted lexicographically
    /// before acquisition so two overlapping-but-not-identical requests
    /// can never deadlock each other.
    pub async fn lock_all(
        &self,
        paths: &[PathBuf],
        token: &CancellationToken,
    ) -> Result<LockGuard, LockError> {
        let mut sorted: Vec<PathBuf> = paths.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for path in sorted {
            let mutex = self.entry(&path);
            tokio::select! {
                g = mutex.lock_owned() => guards.push(g),
                _ = token.cancelled() => return Err(LockError::Cancelled),
            }
        }
        Ok(LockGuard { guards })
    }

    /// Release is implicit via `Drop`; exposed for callers that want to
    /// unlock before the guard's scope ends.
    pub fn unlock_all(&self, guard: LockGuard) {
        drop(guard);
    }

    /// Number of distinct paths currently tracked (test/observability
    /// helper).
    pub fn tracked_paths(&self) -> usize {
        self.locks.lock().len()
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
