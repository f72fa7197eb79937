//! Diagnostic observers for injector events.
//!
//! Observers are attached when an injector is built and inherited by every
//! reflective child created on top of it. [`TracingObserver`] forwards all
//! events to `tracing`.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//! use reflective_di::{Injector, InjectorObserver, Key, Provider, Resolver, Token};
//!
//! #[derive(Default)]
//! struct Counting(AtomicUsize);
//!
//! impl InjectorObserver for Counting {
//!     fn instantiating(&self, _injector: &str, _key: &Key) {}
//!     fn instantiated(&self, _injector: &str, _key: &Key, _elapsed: Duration) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let counting = Arc::new(Counting::default());
//! let answer = Token::opaque("answer");
//! let injector = Injector::builder("root")
//!     .provider(Provider::provide(&answer).use_value(42u32))
//!     .observer(counting.clone())
//!     .build()
//!     .unwrap();
//!
//! injector.get_any(&answer).unwrap();
//! injector.get_any(&answer).unwrap();
//! assert_eq!(counting.0.load(Ordering::SeqCst), 1);
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Hooks for injector lifecycle events.
///
/// `injector` is the display name of the injector that owns the provider.
pub trait InjectorObserver: Send + Sync {
    /// A provider is about to be instantiated.
    fn instantiating(&self, injector: &str, key: &Key);

    /// A provider was instantiated and cached.
    fn instantiated(&self, injector: &str, key: &Key, elapsed: Duration);

    fn instantiation_failed(&self, _injector: &str, _key: &Key, _error: &DiError) {}

    /// A destroy hook ran.
    fn destroyed(&self, _injector: &str, _key: &Key) {}
}

#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Arc<Vec<Arc<dyn InjectorObserver>>>,
}

impl Observers {
    pub(crate) fn new(observers: Vec<Arc<dyn InjectorObserver>>) -> Self {
        Self {
            observers: Arc::new(observers),
        }
    }

    /// Parent observers first, then `extra`.
    pub(crate) fn extend(&self, extra: Vec<Arc<dyn InjectorObserver>>) -> Self {
        if extra.is_empty() {
            return self.clone();
        }
        let mut all: Vec<_> = self.observers.iter().cloned().collect();
        all.extend(extra);
        Self::new(all)
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn instantiating(&self, injector: &str, key: &Key) {
        for observer in self.observers.iter() {
            observer.instantiating(injector, key);
        }
    }

    #[inline]
    pub(crate) fn instantiated(&self, injector: &str, key: &Key, elapsed: Duration) {
        for observer in self.observers.iter() {
            observer.instantiated(injector, key, elapsed);
        }
    }

    pub(crate) fn instantiation_failed(&self, injector: &str, key: &Key, error: &DiError) {
        for observer in self.observers.iter() {
            observer.instantiation_failed(injector, key, error);
        }
    }

    pub(crate) fn destroyed(&self, injector: &str, key: &Key) {
        for observer in self.observers.iter() {
            observer.destroyed(injector, key);
        }
    }
}

/// Observer that emits `tracing` events.
///
/// Instantiation events are logged at `trace`, failures at `debug` and
/// destroy hooks at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl InjectorObserver for TracingObserver {
    fn instantiating(&self, injector: &str, key: &Key) {
        tracing::trace!(injector, token = %key, "instantiating");
    }

    fn instantiated(&self, injector: &str, key: &Key, elapsed: Duration) {
        tracing::trace!(injector, token = %key, elapsed_us = elapsed.as_micros() as u64, "instantiated");
    }

    fn instantiation_failed(&self, injector: &str, key: &Key, error: &DiError) {
        tracing::debug!(injector, token = %key, %error, "instantiation failed");
    }

    fn destroyed(&self, injector: &str, key: &Key) {
        tracing::debug!(injector, token = %key, "destroy hook invoked");
    }
}
