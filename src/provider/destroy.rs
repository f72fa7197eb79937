//! Destroy-hook tracking for operation injectors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::internal::DestroyBag;
use crate::lifetime::ProviderScope;

use super::Injector;

/// Pending destroy hooks of one operation.
///
/// Operation injectors are registered when they are built, before anything
/// in them is instantiated. [`destroy`](Self::destroy) then invokes the hook
/// of every registered provider that was actually built, newest
/// registration first. Calling it again does nothing.
///
/// Tracking the same injector twice registers its hooks once. Once
/// destroyed, a tracker refuses new registrations.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use reflective_di::{DestroyTracker, Factory, Injector, Provider, ProviderScope, Resolver, Token};
///
/// let closed = Arc::new(AtomicUsize::new(0));
/// let seen = closed.clone();
/// let session = Token::opaque("session");
///
/// let injector = Injector::create(
///     "operation",
///     &[Provider::provide(&session)
///         .scope(ProviderScope::Operation)
///         .use_factory(Factory::new(|_| Ok(7u32)).on_destroy(move |_: &u32| {
///             seen.fetch_add(1, Ordering::SeqCst);
///         }))],
///     None,
///     None,
/// ).unwrap();
///
/// let tracker = DestroyTracker::new();
/// tracker.track(&injector);
///
/// injector.get_any(&session).unwrap();
/// injector.get_any(&session).unwrap();
///
/// assert_eq!(tracker.destroy(), 1);
/// assert_eq!(tracker.destroy(), 0);
/// assert_eq!(closed.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct DestroyTracker {
    bag: Mutex<DestroyBag>,
    destroyed: AtomicBool,
}

impl DestroyTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every operation-scoped provider of `injector` that has a
    /// destroy hook. Returns how many new hooks were registered; 0 when the
    /// injector was already tracked or the tracker is destroyed.
    pub fn track(&self, injector: &Arc<Injector>) -> usize {
        let mut bag = self.bag.lock();
        if self.is_destroyed() {
            tracing::warn!(injector = %injector.name(), "tracking refused, operation already destroyed");
            return 0;
        }
        let mut tracked = 0;
        for provider in injector.providers() {
            if provider.scope() != ProviderScope::Operation {
                continue;
            }
            if let Some(hook) = &provider.meta.destroy {
                if bag.push(injector.clone(), provider.key.clone(), hook.clone()) {
                    tracked += 1;
                }
            }
        }
        tracked
    }

    /// Runs the hooks of all instantiated providers. Returns how many ran.
    pub fn destroy(&self) -> usize {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let entries: Vec<_> = self.bag.lock().drain_reverse().collect();
        let mut invoked = 0;
        for (injector, key, hook) in entries {
            let Some(obj) = injector.instance_by_key(&key) else {
                continue;
            };
            hook(&obj);
            injector.observers().destroyed(injector.name(), &key);
            invoked += 1;
        }
        tracing::debug!(hooks = invoked, "operation destroyed");
        invoked
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Number of registered hooks not yet run.
    pub fn len(&self) -> usize {
        self.bag.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
