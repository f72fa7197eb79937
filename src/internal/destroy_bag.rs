//! Internal bag of pending destroy hooks.

use std::collections::HashSet;
use std::sync::Arc;

use crate::key::Key;
use crate::metadata::DestroyHook;
use crate::provider::Injector;

/// Destroy hooks registered for one operation, run in LIFO order.
///
/// An (injector, key) pair is held at most once.
#[derive(Default)]
pub(crate) struct DestroyBag {
    entries: Vec<(Arc<Injector>, Key, DestroyHook)>,
    seen: HashSet<(usize, usize)>,
}

impl DestroyBag {
    /// Returns `false` when the pair is already in the bag.
    pub(crate) fn push(&mut self, injector: Arc<Injector>, key: Key, hook: DestroyHook) -> bool {
        // the bag keeps the injector alive, so its address is not reused
        let identity = (Arc::as_ptr(&injector) as usize, key.id());
        if !self.seen.insert(identity) {
            return false;
        }
        self.entries.push((injector, key, hook));
        true
    }

    /// Removes every entry, newest first.
    pub(crate) fn drain_reverse(&mut self) -> impl Iterator<Item = (Arc<Injector>, Key, DestroyHook)> {
        self.seen.clear();
        std::mem::take(&mut self.entries).into_iter().rev()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
