//! Cyclic dependency detection.
//!
//! Every injector counts the instantiations it has started. A graph that
//! resolves correctly builds each of an injector's providers at most once,
//! so a counter that passes the number of providers means some provider is
//! being built again while its first construction is still running.

use std::sync::atomic::{AtomicUsize, Ordering};

/// One started instantiation on one injector.
///
/// Dropping the guard without [`commit`](Self::commit) rolls the counter
/// back, so a failed construction can be retried later.
pub(crate) struct ConstructionGuard<'a> {
    counter: &'a AtomicUsize,
    committed: bool,
}

impl<'a> ConstructionGuard<'a> {
    /// Starts an instantiation, or returns `None` when the counter has
    /// already passed `limit`.
    pub(crate) fn enter(counter: &'a AtomicUsize, limit: usize) -> Option<Self> {
        let started = counter.fetch_add(1, Ordering::SeqCst);
        if started > limit {
            counter.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(Self {
            counter,
            committed: false,
        })
    }

    pub(crate) fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
