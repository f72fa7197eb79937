//! Resolver traits for token lookup.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{InjectionToken, Key, Token, TokenRef};
use crate::provider::scope::Contextual;
use crate::provider::Injector;
use crate::registration::AnyArc;

/// Core resolver trait for object-safe lookups.
///
/// [`Injector`] implements it, and so can any external container that
/// should sit at the top of an injector chain. A reflective injector whose
/// parent is not an `Injector` delegates to that parent with the same
/// `optional` flag and treats it as the end of the chain.
///
/// Most users should use the [`Resolver`] trait instead, which provides
/// typed methods built on top of this one.
pub trait ResolverCore: Send + Sync {
    /// Looks up `key`.
    ///
    /// With `optional` set, a token nobody provides yields `Ok(None)`;
    /// otherwise it fails with [`DiError::NoProvider`]. Cycle and
    /// instantiation errors are returned either way.
    fn resolve_key(&self, key: &Key, optional: bool) -> DiResult<Option<AnyArc>>;

    /// Name used in error messages.
    fn display_name(&self) -> String;

    /// Downcast hook used to walk chains of reflective injectors.
    fn as_injector(&self) -> Option<&Injector> {
        None
    }
}

/// Typed lookups over [`ResolverCore`].
///
/// Implemented for every resolver, including `dyn ResolverCore`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use reflective_di::{Injector, Provider, Resolver, Token};
///
/// #[derive(Debug, PartialEq)]
/// struct Config { env: &'static str }
///
/// let config = Arc::new(Config { env: "test" });
/// let injector = Injector::create(
///     "root",
///     &[Provider::provide(Token::of::<Config>()).use_arc(config.clone())],
///     None,
///     None,
/// ).unwrap();
///
/// // Values are returned by identity.
/// assert!(Arc::ptr_eq(&injector.get::<Config>().unwrap(), &config));
///
/// // Missing tokens can be probed or defaulted.
/// assert!(injector.try_get::<String>().unwrap().is_none());
/// let fallback = injector.get_or(Token::of::<String>(), Arc::new("none".to_string())).unwrap();
/// assert_eq!(*fallback, "none");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the type `T` under its own token.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get_as::<T>(Token::of::<T>())
    }

    /// Resolves `token` and downcasts the value to `T`.
    fn get_as<T: Send + Sync + 'static>(&self, token: impl Into<TokenRef>) -> DiResult<Arc<T>> {
        downcast(self.get_any(token)?)
    }

    /// Resolves a typed injection token.
    fn get_token<T: Send + Sync + 'static>(&self, token: &InjectionToken<T>) -> DiResult<Arc<T>> {
        self.get_as::<T>(token)
    }

    /// Resolves `token` without downcasting.
    fn get_any(&self, token: impl Into<TokenRef>) -> DiResult<AnyArc> {
        let key = Key::get(token);
        match self.resolve_key(&key, false)? {
            Some(value) => Ok(value),
            None => Err(DiError::no_provider(&self.display_name(), key)),
        }
    }

    /// Like [`get`](Self::get), but `None` when nothing provides `T`.
    fn try_get<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.try_get_as::<T>(Token::of::<T>())
    }

    fn try_get_as<T: Send + Sync + 'static>(
        &self,
        token: impl Into<TokenRef>,
    ) -> DiResult<Option<Arc<T>>> {
        match self.resolve_key(&Key::get(token), true)? {
            Some(value) => downcast(value).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves `token`, returning `not_found` when nothing provides it.
    fn get_or<T: Send + Sync + 'static>(
        &self,
        token: impl Into<TokenRef>,
        not_found: Arc<T>,
    ) -> DiResult<Arc<T>> {
        Ok(self.try_get_as::<T>(token)?.unwrap_or(not_found))
    }

    /// Resolves the execution-context view of `T`.
    ///
    /// Only available below a shadow injector built with
    /// [`Injector::create_with_execution_context`].
    fn get_contextual<T: Send + Sync + 'static>(&self) -> DiResult<Arc<Contextual<T>>> {
        self.get::<Contextual<T>>()
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

fn downcast<T: Send + Sync + 'static>(value: AnyArc) -> DiResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}
