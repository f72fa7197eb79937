//! Reflective injector.
//!
//! This module contains the [`Injector`] type, which owns a set of resolved
//! providers, instantiates them lazily and caches the results, and forwards
//! lookups it cannot answer to its parent and fallback.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Weak};
use std::time::Instant;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, ReentrantMutex};

use crate::descriptors::ProviderDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::ConstructionGuard;
use crate::key::{Key, TokenRef};
use crate::observer::{InjectorObserver, Observers};
use crate::registration::{AnyArc, Provider};
use crate::resolution::{resolve_providers, ResolvedProvider};
use crate::traits::ResolverCore;

pub mod context;
pub mod destroy;
pub mod scope;

pub use context::Args;
pub use destroy::DestroyTracker;
pub use scope::{Contextual, ExecutionContext};

static INJECTOR_KEY: Lazy<Key> = Lazy::new(Key::of::<Injector>);

const DEFAULT_NAME: &str = "ReflectiveInjector";

/// Hierarchical injector with lazy, memoized instantiation.
///
/// An injector owns an immutable list of resolved providers and a cache with
/// one slot per provider. A lookup walks from this injector up through its
/// reflective parents and returns the first provider found, instantiating
/// it on the injector that owns it. Nothing is built until asked for, and
/// nothing is built twice.
///
/// # Lookup order
///
/// 1. The injector itself and its chain of reflective parents.
/// 2. If that chain ends in an external [`ResolverCore`], that resolver,
///    probed without failing.
/// 3. The fallback, walked the same way.
/// 4. The not-found value of the caller, or [`DiError::NoProvider`].
///
/// Asking any injector for `Injector` returns the injector itself.
///
/// # Thread safety
///
/// `Injector` is `Send + Sync`. Cached lookups only take the cache lock.
/// First instantiations on one injector are serialized behind a reentrant
/// lock, so a factory runs at most once even when threads race for it, and
/// the construction counter only ever counts the providers actually built.
/// The thread holding the lock may re-enter it while resolving dependencies,
/// which is how cycles still reach the counter. Locks are taken child
/// before parent and operation injector before application injector, so
/// trees built by [`Application`](crate::Application) cannot deadlock.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use reflective_di::{Injectable, InjectableMetadata, Injector, Provider, Resolver};
///
/// struct Config { env: &'static str }
///
/// impl Injectable for Config {
///     fn metadata() -> InjectableMetadata<Self> {
///         InjectableMetadata::new(|_| Ok(Config { env: "test" }))
///     }
/// }
///
/// let parent = Injector::create("parent", &[Provider::class::<Config>()], None, None).unwrap();
/// let child = Injector::create("child", &[], Some(parent.clone()), None).unwrap();
///
/// let from_child = child.get::<Config>().unwrap();
/// let from_parent = parent.get::<Config>().unwrap();
/// assert!(Arc::ptr_eq(&from_child, &from_parent));
/// assert_eq!(from_child.env, "test");
/// ```
pub struct Injector {
    name: String,
    providers: Vec<ResolvedProvider>,
    index: HashMap<usize, usize>,
    objs: Mutex<Vec<Option<AnyArc>>>,
    construction_counter: AtomicUsize,
    construction: ReentrantMutex<()>,
    parent: Option<Arc<dyn ResolverCore>>,
    fallback: Option<Arc<dyn ResolverCore>>,
    observers: Observers,
    this: Weak<Injector>,
}

impl Injector {
    /// Creates an injector over already resolved providers.
    pub fn new(
        providers: Vec<ResolvedProvider>,
        parent: Option<Arc<dyn ResolverCore>>,
        fallback: Option<Arc<dyn ResolverCore>>,
    ) -> Arc<Self> {
        Self::assemble(DEFAULT_NAME.to_string(), providers, parent, fallback, Vec::new())
    }

    /// Resolves `providers` and creates a named injector.
    ///
    /// Declaration errors (`InvalidProvider`, `NoAnnotation`) are reported
    /// here rather than at the first lookup.
    pub fn create(
        name: impl Into<String>,
        providers: &[Provider],
        parent: Option<Arc<dyn ResolverCore>>,
        fallback: Option<Arc<dyn ResolverCore>>,
    ) -> DiResult<Arc<Self>> {
        let resolved = resolve_providers(providers)?;
        Ok(Self::assemble(name.into(), resolved, parent, fallback, Vec::new()))
    }

    /// Starts a builder for an injector with observers.
    pub fn builder(name: impl Into<String>) -> InjectorBuilder {
        InjectorBuilder::new(name)
    }

    pub(crate) fn assemble(
        name: String,
        providers: Vec<ResolvedProvider>,
        parent: Option<Arc<dyn ResolverCore>>,
        fallback: Option<Arc<dyn ResolverCore>>,
        observers: Vec<Arc<dyn InjectorObserver>>,
    ) -> Arc<Self> {
        let index = providers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.key.id(), i))
            .collect::<HashMap<_, _>>();
        let inherited = parent
            .as_ref()
            .and_then(|p| p.as_injector())
            .map(|p| p.observers.clone())
            .unwrap_or_default();

        tracing::debug!(injector = %name, providers = providers.len(), "injector created");

        Arc::new_cyclic(|this| Self {
            objs: Mutex::new(vec![None; providers.len()]),
            name,
            providers,
            index,
            construction_counter: AtomicUsize::new(0),
            construction: ReentrantMutex::new(()),
            parent,
            fallback,
            observers: inherited.extend(observers),
            this: this.clone(),
        })
    }

    /// The name used in error paths and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved providers owned by this injector, in registration order.
    pub fn providers(&self) -> &[ResolvedProvider] {
        &self.providers
    }

    /// The parent consulted after this injector's own providers.
    pub fn parent(&self) -> Option<&Arc<dyn ResolverCore>> {
        self.parent.as_ref()
    }

    /// The resolver walked once the parent chain has nothing.
    pub fn fallback(&self) -> Option<&Arc<dyn ResolverCore>> {
        self.fallback.as_ref()
    }

    /// Instantiates every provider owned by this injector, in registration order.
    pub fn instantiate_all(&self) -> DiResult<()> {
        tracing::debug!(injector = %self.name, providers = self.providers.len(), "instantiating all providers");
        for provider in &self.providers {
            self.get_obj_by_key_id(&provider.key)?;
        }
        Ok(())
    }

    /// Whether this injector owns a provider for `token` and has built it.
    pub fn is_instantiated(&self, token: impl Into<TokenRef>) -> bool {
        self.instance(token).is_some()
    }

    /// The cached instance for `token`, without instantiating anything.
    pub fn instance(&self, token: impl Into<TokenRef>) -> Option<AnyArc> {
        self.instance_by_key(&Key::get(token))
    }

    pub(crate) fn instance_by_key(&self, key: &Key) -> Option<AnyArc> {
        let index = *self.index.get(&key.id())?;
        self.objs.lock()[index].clone()
    }

    pub(crate) fn self_arc(&self) -> Option<Arc<Injector>> {
        self.this.upgrade()
    }

    pub(crate) fn observers(&self) -> &Observers {
        &self.observers
    }

    /// Provider descriptors for introspection.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        let objs = self.objs.lock();
        self.providers
            .iter()
            .zip(objs.iter())
            .map(|(provider, obj)| ProviderDescriptor::from_resolved(provider, obj.is_some()))
            .collect()
    }

    /// Walks this injector and its reflective parents, then the external
    /// terminal if the chain ends in one.
    fn walk(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        let mut current: &Injector = self;
        loop {
            if let Some(obj) = current.get_obj_by_key_id(key)? {
                return Ok(Some(obj));
            }
            match &current.parent {
                None => return Ok(None),
                Some(parent) => match parent.as_injector() {
                    Some(injector) => current = injector,
                    None => return parent.resolve_key(key, true),
                },
            }
        }
    }

    fn get_obj_by_key_id(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        let Some(&index) = self.index.get(&key.id()) else {
            return Ok(None);
        };
        if let Some(obj) = self.objs.lock()[index].clone() {
            return Ok(Some(obj));
        }

        let _construction = self.construction.lock();
        if let Some(obj) = self.objs.lock()[index].clone() {
            return Ok(Some(obj));
        }
        let obj = self.new_instance(&self.providers[index])?;
        self.objs.lock()[index] = Some(obj.clone());
        Ok(Some(obj))
    }

    fn new_instance(&self, provider: &ResolvedProvider) -> DiResult<AnyArc> {
        let guard = ConstructionGuard::enter(&self.construction_counter, self.providers.len())
            .ok_or_else(|| DiError::cyclic(&self.name, provider.key.clone()))?;
        let obj = self.instantiate(provider)?;
        guard.commit();
        Ok(obj)
    }

    fn instantiate(&self, provider: &ResolvedProvider) -> DiResult<AnyArc> {
        if !self.observers.has_observers() {
            return self.build(provider);
        }

        let start = Instant::now();
        self.observers.instantiating(&self.name, &provider.key);
        let result = self.build(provider);
        match &result {
            Ok(_) => self.observers.instantiated(&self.name, &provider.key, start.elapsed()),
            Err(e) => self.observers.instantiation_failed(&self.name, &provider.key, e),
        }
        result
    }

    /// Resolves dependencies depth-first, then runs the factory.
    fn build(&self, provider: &ResolvedProvider) -> DiResult<AnyArc> {
        let dependencies = &provider.factory.dependencies;
        let mut values = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            match self.resolve_key(&dep.key, dep.optional) {
                Ok(value) => values.push(value),
                Err(mut e) => {
                    e.add_key(provider.key.clone());
                    return Err(e);
                }
            }
        }

        let owner = provider.key.display_name();
        let args = Args::new(&owner, &values);
        (provider.factory.factory)(&args)
            .map_err(|source| DiError::instantiation(&self.name, provider.key.clone(), source))
    }
}

impl ResolverCore for Injector {
    fn resolve_key(&self, key: &Key, optional: bool) -> DiResult<Option<AnyArc>> {
        if *key == *INJECTOR_KEY {
            if let Some(me) = self.self_arc() {
                return Ok(Some(me as AnyArc));
            }
        }

        if let Some(obj) = self.walk(key)? {
            return Ok(Some(obj));
        }

        if let Some(fallback) = &self.fallback {
            let found = match fallback.as_injector() {
                Some(injector) => injector.walk(key)?,
                None => fallback.resolve_key(key, true)?,
            };
            if found.is_some() {
                return Ok(found);
            }
        }

        if optional {
            Ok(None)
        } else {
            Err(DiError::no_provider(&self.name, key.clone()))
        }
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn as_injector(&self) -> Option<&Injector> {
        Some(self)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("name", &self.name)
            .field("providers", &self.providers.len())
            .field("parent", &self.parent.as_ref().map(|p| p.display_name()))
            .field("fallback", &self.fallback.as_ref().map(|p| p.display_name()))
            .finish()
    }
}

/// Builder for injectors that need observers.
pub struct InjectorBuilder {
    name: String,
    providers: Vec<Provider>,
    parent: Option<Arc<dyn ResolverCore>>,
    fallback: Option<Arc<dyn ResolverCore>>,
    observers: Vec<Arc<dyn InjectorObserver>>,
}

impl InjectorBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            providers: Vec::new(),
            parent: None,
            fallback: None,
            observers: Vec::new(),
        }
    }

    /// Adds one provider.
    pub fn provider(mut self, provider: impl Into<Provider>) -> Self {
        self.providers.push(provider.into());
        self
    }

    /// Adds several providers, keeping their order.
    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Sets the parent resolver.
    pub fn parent(mut self, parent: Arc<dyn ResolverCore>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the fallback resolver.
    pub fn fallback(mut self, fallback: Arc<dyn ResolverCore>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Adds an observer. Observers of a reflective parent are inherited.
    pub fn observer(mut self, observer: Arc<dyn InjectorObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Resolves the providers and creates the injector.
    pub fn build(self) -> DiResult<Arc<Injector>> {
        let resolved = resolve_providers(&self.providers)?;
        Ok(Injector::assemble(
            self.name,
            resolved,
            self.parent,
            self.fallback,
            self.observers,
        ))
    }
}
