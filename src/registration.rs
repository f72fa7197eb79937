//! Provider declarations.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::key::TokenRef;
use crate::lifetime::ProviderScope;
use crate::metadata::{ClassRef, Factory, Injectable};

// Type-erased Arc for storage
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// A declaration of how to produce a value for a token.
///
/// ```rust
/// use reflective_di::{Factory, Provider, ProviderScope, Token};
///
/// let env = Token::opaque("env");
/// let providers = Provider::group([
///     Provider::provide(&env).use_value("test".to_string()),
///     Provider::provide(Token::opaque("request-id"))
///         .scope(ProviderScope::Operation)
///         .use_factory(Factory::new(|_| Ok(42u64))),
/// ]);
///
/// assert!(matches!(providers, Provider::Group(ref children) if children.len() == 2));
/// ```
#[derive(Clone)]
pub enum Provider {
    /// A bare injectable type, provided under its own token.
    Type(ClassRef),
    /// `provide` plus one production strategy.
    Declared(ProviderDecl),
    /// Nested declarations, flattened when resolved.
    Group(Vec<Provider>),
}

impl Provider {
    /// Bare class provider: `T` is both the token and the implementation.
    pub fn class<T: Injectable>() -> Self {
        Provider::Type(ClassRef::of::<T>())
    }

    /// Starts a declaration for `token`. Finish it with one of the `use_*` methods.
    pub fn provide(token: impl Into<TokenRef>) -> ProviderDecl {
        ProviderDecl {
            provide: token.into(),
            strategy: None,
            scope: None,
        }
    }

    pub fn group(providers: impl IntoIterator<Item = Provider>) -> Self {
        Provider::Group(providers.into_iter().collect())
    }

    /// Overrides the scope of this provider (of every child for a group).
    pub fn in_scope(self, scope: ProviderScope) -> Self {
        match self {
            Provider::Type(class) => Provider::Declared(ProviderDecl {
                provide: class.token().into(),
                strategy: Some(Strategy::Class(class)),
                scope: Some(scope),
            }),
            Provider::Declared(mut decl) => {
                decl.scope = Some(scope);
                Provider::Declared(decl)
            }
            Provider::Group(children) => {
                Provider::Group(children.into_iter().map(|p| p.in_scope(scope)).collect())
            }
        }
    }

    /// Effective scope: an explicit tag wins, then the class metadata, then singleton.
    ///
    /// Groups report the default; partition them with
    /// [`ScopedProviders`](crate::ScopedProviders) instead.
    pub fn scope(&self) -> ProviderScope {
        match self {
            Provider::Type(class) => class.scope().unwrap_or_default(),
            Provider::Declared(decl) => decl.effective_scope(),
            Provider::Group(_) => ProviderScope::default(),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Type(class) => fmt::Debug::fmt(class, f),
            Provider::Declared(decl) => fmt::Debug::fmt(decl, f),
            Provider::Group(children) => f.debug_list().entries(children).finish(),
        }
    }
}

impl From<ProviderDecl> for Provider {
    fn from(decl: ProviderDecl) -> Self {
        Provider::Declared(decl)
    }
}

impl From<Vec<Provider>> for Provider {
    fn from(providers: Vec<Provider>) -> Self {
        Provider::Group(providers)
    }
}

/// How a declared provider produces its value.
#[derive(Clone)]
pub enum Strategy {
    /// A fixed value, returned by identity.
    Value(AnyArc),
    /// Construct an injectable type.
    Class(ClassRef),
    /// Call a factory with its resolved arguments.
    Factory(Factory),
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Value(_) => f.write_str("Value"),
            Strategy::Class(class) => fmt::Debug::fmt(class, f),
            Strategy::Factory(factory) => fmt::Debug::fmt(factory, f),
        }
    }
}

/// A `{ provide, use*, scope }` declaration.
#[derive(Clone)]
pub struct ProviderDecl {
    pub(crate) provide: TokenRef,
    pub(crate) strategy: Option<Strategy>,
    pub(crate) scope: Option<ProviderScope>,
}

impl ProviderDecl {
    pub fn scope(mut self, scope: ProviderScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn use_value<T: Send + Sync + 'static>(self, value: T) -> Provider {
        self.use_arc(Arc::new(value))
    }

    /// Provides an existing `Arc`; lookups return this exact allocation.
    pub fn use_arc<T: Send + Sync + 'static>(self, value: Arc<T>) -> Provider {
        self.with_strategy(Strategy::Value(value))
    }

    pub fn use_class<C: Injectable>(self) -> Provider {
        self.with_strategy(Strategy::Class(ClassRef::of::<C>()))
    }

    pub fn use_factory(self, factory: Factory) -> Provider {
        self.with_strategy(Strategy::Factory(factory))
    }

    fn with_strategy(mut self, strategy: Strategy) -> Provider {
        self.strategy = Some(strategy);
        Provider::Declared(self)
    }

    pub fn token(&self) -> &TokenRef {
        &self.provide
    }

    pub fn strategy(&self) -> Option<&Strategy> {
        self.strategy.as_ref()
    }

    pub(crate) fn effective_scope(&self) -> ProviderScope {
        match (self.scope, &self.strategy) {
            (Some(scope), _) => scope,
            (None, Some(Strategy::Class(class))) => class.scope().unwrap_or_default(),
            _ => ProviderScope::default(),
        }
    }
}

impl fmt::Debug for ProviderDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Provider");
        s.field("provide", &format_args!("{}", self.provide));
        match &self.strategy {
            Some(strategy) => s.field("use", strategy),
            None => s.field("use", &format_args!("<none>")),
        };
        if let Some(scope) = self.scope {
            s.field("scope", &format_args!("{}", scope));
        }
        s.finish()
    }
}
