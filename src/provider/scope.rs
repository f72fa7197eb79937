//! Execution-context views of singleton objects.
//!
//! A singleton built once per application sometimes needs to read values of
//! the operation currently in flight. Its metadata marks those properties
//! with [`InjectableMetadata::execution_context`](crate::InjectableMetadata::execution_context).
//! For every operation, [`Injector::create_with_execution_context`] builds a
//! shadow injector that exposes each such singleton as a [`Contextual<T>`]:
//! the same `Arc<T>`, plus a handle that reads the current context on every
//! access.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use reflective_di::{
//!     ExecutionContext, Injectable, InjectableMetadata, Injector, Provider, Resolver,
//! };
//!
//! struct Users;
//!
//! impl Injectable for Users {
//!     fn metadata() -> InjectableMetadata<Self> {
//!         InjectableMetadata::new(|_| Ok(Users)).execution_context("caller")
//!     }
//! }
//!
//! let app = Injector::create("app", &[Provider::class::<Users>()], None, None).unwrap();
//! app.instantiate_all().unwrap();
//!
//! let alice = Injector::create_with_execution_context(
//!     &app,
//!     ExecutionContext::from_value(Arc::new("alice")),
//! ).unwrap();
//! let bob = Injector::create_with_execution_context(
//!     &app,
//!     ExecutionContext::from_value(Arc::new("bob")),
//! ).unwrap();
//!
//! let a = alice.get_contextual::<Users>().unwrap();
//! let b = bob.get_contextual::<Users>().unwrap();
//! assert!(Arc::ptr_eq(a.inner(), b.inner()));
//! assert_eq!(*a.bound_as::<&str>("caller").unwrap(), "alice");
//! assert_eq!(*b.bound_as::<&str>("caller").unwrap(), "bob");
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::ProviderScope;
use crate::registration::AnyArc;
use crate::resolution::value_provider;
use crate::traits::ResolverCore;

use super::Injector;

/// Handle to the context of the operation in flight.
///
/// The getter runs on every access, so a view always reflects the value it
/// returns at that moment.
#[derive(Clone)]
pub struct ExecutionContext {
    getter: Arc<dyn Fn() -> AnyArc + Send + Sync>,
}

impl ExecutionContext {
    /// A context whose value is produced by `getter` on every access.
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> AnyArc + Send + Sync + 'static,
    {
        Self {
            getter: Arc::new(getter),
        }
    }

    /// A context that always returns `value`.
    pub fn from_value<C: Send + Sync + 'static>(value: Arc<C>) -> Self {
        Self::new(move || value.clone() as AnyArc)
    }

    /// Calls the getter.
    pub fn get(&self) -> AnyArc {
        (self.getter)()
    }

    /// The current context, if it is a `C`.
    pub fn current<C: Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.get().downcast::<C>().ok()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExecutionContext")
    }
}

/// A singleton seen through the execution context of one operation.
///
/// Dereferences to the shared `T`. Properties marked as context-bound are
/// read with [`bound`](Self::bound); everything else goes to `T` directly.
pub struct Contextual<T> {
    inner: Arc<T>,
    context: ExecutionContext,
    properties: Arc<[&'static str]>,
}

impl<T> Contextual<T> {
    pub(crate) fn new(inner: Arc<T>, context: ExecutionContext, properties: Arc<[&'static str]>) -> Self {
        Self {
            inner,
            context,
            properties,
        }
    }

    /// The shared singleton.
    pub fn inner(&self) -> &Arc<T> {
        &self.inner
    }

    /// The execution context this view reads from.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Names of the context-bound properties.
    pub fn properties(&self) -> &[&'static str] {
        &self.properties
    }

    /// Whether `property` is context-bound.
    pub fn is_bound(&self, property: &str) -> bool {
        self.properties.iter().any(|p| *p == property)
    }

    /// Current context value for a context-bound property.
    ///
    /// Returns `None` for properties that are not marked.
    pub fn bound(&self, property: &str) -> Option<AnyArc> {
        if self.is_bound(property) {
            Some(self.context.get())
        } else {
            None
        }
    }

    /// [`bound`](Self::bound) downcast to `C`.
    pub fn bound_as<C: Send + Sync + 'static>(&self, property: &str) -> Option<Arc<C>> {
        self.bound(property)?.downcast::<C>().ok()
    }
}

impl<T> Deref for Contextual<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Contextual<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contextual")
            .field("type", &std::any::type_name::<T>())
            .field("properties", &self.properties)
            .finish()
    }
}

impl Injector {
    /// Builds the shadow of `injector` for one operation.
    ///
    /// The shadow is named `<name>:execution-context`, has `injector` as
    /// parent and shares its fallback. It owns one value per context-bound
    /// provider of `injector`, a [`Contextual<T>`] over the existing
    /// instance; every other lookup goes to `injector` and returns the same
    /// objects it does.
    ///
    /// Fails with [`DiError::NotInstantiated`] when a context-bound provider
    /// has not been built yet. Run
    /// [`instantiate_all`](Injector::instantiate_all) on `injector` first.
    pub fn create_with_execution_context(
        injector: &Arc<Injector>,
        context: ExecutionContext,
    ) -> DiResult<Arc<Injector>> {
        let mut views = Vec::new();
        for provider in injector.providers() {
            let Some((token, wrap)) = &provider.meta.contextual else {
                continue;
            };
            let obj = injector
                .instance_by_key(&provider.key)
                .ok_or_else(|| DiError::NotInstantiated {
                    token: provider.key.display_name(),
                    injector: injector.name().to_string(),
                })?;
            let view = wrap(obj, context.clone(), provider.meta.execution_context.clone())
                .ok_or(DiError::TypeMismatch(provider.meta.type_name))?;
            views.push(value_provider(
                Key::get(token),
                view,
                provider.meta.type_name,
                ProviderScope::Singleton,
            ));
        }

        let name = format!("{}:execution-context", injector.name());
        tracing::trace!(injector = %name, views = views.len(), "execution context shadow created");

        Ok(Injector::assemble(
            name,
            views,
            Some(injector.clone() as Arc<dyn ResolverCore>),
            injector.fallback().cloned(),
            Vec::new(),
        ))
    }
}
