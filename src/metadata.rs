//! Injectable metadata tables.
//!
//! Every injectable type describes itself with an [`InjectableMetadata`]
//! built next to the type: the tokens its constructor needs, how to build
//! it from the resolved arguments, its default scope, which properties are
//! bound to the execution context, and whether it has a destroy hook.
//!
//! ```rust
//! use std::sync::Arc;
//! use reflective_di::{Injectable, InjectableMetadata, Injector, Provider, Resolver};
//!
//! struct Database {
//!     url: String,
//! }
//!
//! impl Injectable for Database {
//!     fn metadata() -> InjectableMetadata<Self> {
//!         InjectableMetadata::new(|_| Ok(Database { url: "postgres://localhost".into() }))
//!     }
//! }
//!
//! struct Users {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for Users {
//!     fn metadata() -> InjectableMetadata<Self> {
//!         InjectableMetadata::new(|args| Ok(Users { db: args.get(0)? })).param::<Database>()
//!     }
//! }
//!
//! let injector = Injector::create(
//!     "root",
//!     &[Provider::class::<Database>(), Provider::class::<Users>()],
//!     None,
//!     None,
//! ).unwrap();
//!
//! let users = injector.get::<Users>().unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::key::{Token, TokenRef};
use crate::lifetime::ProviderScope;
use crate::provider::context::Args;
use crate::provider::scope::{Contextual, ExecutionContext};
use crate::registration::AnyArc;
use crate::traits::OnDestroy;

pub(crate) type ErasedCtor = Arc<dyn Fn(&Args<'_>) -> Result<AnyArc, BoxError> + Send + Sync>;
pub(crate) type DestroyHook = Arc<dyn Fn(&AnyArc) + Send + Sync>;
pub(crate) type ContextualWrap =
    Arc<dyn Fn(AnyArc, ExecutionContext, Arc<[&'static str]>) -> Option<AnyArc> + Send + Sync>;

type TypedCtor<T> = Arc<dyn Fn(&Args<'_>) -> Result<T, BoxError> + Send + Sync>;

/// Metadata for one constructor or factory parameter.
#[derive(Clone, Debug)]
pub struct ParamMeta {
    /// Token to inject, `None` when the parameter type is unknown.
    pub token: Option<TokenRef>,
    /// Resolve to `None` instead of failing when nothing provides the token.
    pub optional: bool,
}

/// Ordered parameter list of a constructor or factory.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    params: Vec<ParamMeta>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter whose token is the type `T`.
    pub fn param<T: ?Sized + 'static>(self) -> Self {
        self.param_token(Token::of::<T>())
    }

    /// Appends a parameter with an explicit token.
    pub fn param_token(mut self, token: impl Into<TokenRef>) -> Self {
        self.params.push(ParamMeta {
            token: Some(token.into()),
            optional: false,
        });
        self
    }

    /// Appends a parameter whose type could not be determined.
    ///
    /// Building a provider from such a signature fails with
    /// [`DiError::NoAnnotation`](crate::DiError::NoAnnotation) unless the
    /// position is later overridden with [`inject`](Self::inject).
    pub fn unannotated(mut self) -> Self {
        self.params.push(ParamMeta {
            token: None,
            optional: false,
        });
        self
    }

    /// Overrides the token injected at `index`.
    pub fn inject(mut self, index: usize, token: impl Into<TokenRef>) -> Self {
        self.slot(index).token = Some(token.into());
        self
    }

    /// Marks the parameter at `index` as optional.
    pub fn optional(mut self, index: usize) -> Self {
        self.slot(index).optional = true;
        self
    }

    fn slot(&mut self, index: usize) -> &mut ParamMeta {
        while self.params.len() <= index {
            self.params.push(ParamMeta {
                token: None,
                optional: false,
            });
        }
        &mut self.params[index]
    }

    pub fn params(&self) -> &[ParamMeta] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .params
            .iter()
            .map(|p| match &p.token {
                Some(token) => token.to_string(),
                None => "?".to_string(),
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}

macro_rules! signature_builders {
    () => {
        /// Appends a parameter whose token is the type `D`.
        pub fn param<D: ?Sized + 'static>(mut self) -> Self {
            self.signature = self.signature.param::<D>();
            self
        }

        /// Appends a parameter with an explicit token.
        pub fn param_token(mut self, token: impl Into<TokenRef>) -> Self {
            self.signature = self.signature.param_token(token);
            self
        }

        /// Appends a parameter whose type could not be determined.
        pub fn unannotated(mut self) -> Self {
            self.signature = self.signature.unannotated();
            self
        }

        /// Overrides the token injected at `index`.
        pub fn inject(mut self, index: usize, token: impl Into<TokenRef>) -> Self {
            self.signature = self.signature.inject(index, token);
            self
        }

        /// Marks the parameter at `index` as optional.
        pub fn optional(mut self, index: usize) -> Self {
            self.signature = self.signature.optional(index);
            self
        }

        pub fn signature(&self) -> &Signature {
            &self.signature
        }
    };
}

/// Metadata table of an injectable type.
pub struct InjectableMetadata<T> {
    signature: Signature,
    ctor: TypedCtor<T>,
    scope: Option<ProviderScope>,
    execution_context: Vec<&'static str>,
    destroy: Option<Arc<dyn Fn(&T) + Send + Sync>>,
}

impl<T: Send + Sync + 'static> InjectableMetadata<T> {
    /// Starts a table with the constructor that receives resolved arguments
    /// in parameter order.
    pub fn new<F>(ctor: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            signature: Signature::new(),
            ctor: Arc::new(ctor),
            scope: None,
            execution_context: Vec::new(),
            destroy: None,
        }
    }

    signature_builders!();

    pub fn scope(mut self, scope: ProviderScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Marks `property` as bound to the execution context of the current
    /// operation. See [`Contextual`].
    pub fn execution_context(mut self, property: &'static str) -> Self {
        if !self.execution_context.contains(&property) {
            self.execution_context.push(property);
        }
        self
    }

    /// Registers [`OnDestroy::on_destroy`] as the destroy hook.
    pub fn with_destroy_hook(self) -> Self
    where
        T: OnDestroy,
    {
        self.on_destroy(T::on_destroy)
    }

    pub fn on_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let hook: Arc<dyn Fn(&T) + Send + Sync> = Arc::new(hook);
        self.destroy = Some(hook);
        self
    }
}

/// A type that can be constructed by an injector.
pub trait Injectable: Send + Sync + Sized + 'static {
    fn metadata() -> InjectableMetadata<Self>;
}

pub(crate) struct ClassInfo {
    pub(crate) token: Token,
    pub(crate) type_name: &'static str,
    pub(crate) signature: Signature,
    pub(crate) ctor: ErasedCtor,
    pub(crate) scope: Option<ProviderScope>,
    pub(crate) execution_context: Arc<[&'static str]>,
    pub(crate) destroy: Option<DestroyHook>,
    pub(crate) contextual_token: Token,
    pub(crate) contextual: ContextualWrap,
}

/// Type-erased reference to an [`Injectable`] type and its metadata.
#[derive(Clone)]
pub struct ClassRef {
    pub(crate) info: Arc<ClassInfo>,
}

impl ClassRef {
    pub fn of<T: Injectable>() -> Self {
        let meta = T::metadata();
        let ctor = meta.ctor;
        let erased: ErasedCtor = Arc::new(move |args: &Args<'_>| -> Result<AnyArc, BoxError> {
            let value = ctor(args)?;
            Ok(Arc::new(value) as AnyArc)
        });
        let destroy = meta.destroy.map(erase_destroy_hook::<T>);
        let contextual: ContextualWrap = Arc::new(
            |obj: AnyArc, context: ExecutionContext, properties: Arc<[&'static str]>| {
                let inner = obj.downcast::<T>().ok()?;
                Some(Arc::new(Contextual::new(inner, context, properties)) as AnyArc)
            },
        );

        Self {
            info: Arc::new(ClassInfo {
                token: Token::of::<T>(),
                type_name: std::any::type_name::<T>(),
                signature: meta.signature,
                ctor: erased,
                scope: meta.scope,
                execution_context: meta.execution_context.into(),
                destroy,
                contextual_token: Token::of::<Contextual<T>>(),
                contextual,
            }),
        }
    }

    pub fn token(&self) -> &Token {
        &self.info.token
    }

    pub fn type_name(&self) -> &'static str {
        self.info.type_name
    }

    pub fn signature(&self) -> &Signature {
        &self.info.signature
    }

    /// Scope recorded in the metadata table, if any.
    pub fn scope(&self) -> Option<ProviderScope> {
        self.info.scope
    }

    pub fn execution_context(&self) -> &[&'static str] {
        &self.info.execution_context
    }

    pub fn has_destroy_hook(&self) -> bool {
        self.info.destroy.is_some()
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.info.type_name)
    }
}

/// A factory function together with its parameter metadata.
///
/// ```rust
/// use reflective_di::{Factory, Injector, Provider, Resolver, Token};
///
/// let base = Token::opaque("base");
/// let doubled = Token::opaque("doubled");
///
/// let injector = Injector::create(
///     "root",
///     &[
///         Provider::provide(&base).use_value(21u32),
///         Provider::provide(&doubled).use_factory(
///             Factory::new(|args| Ok(*args.get::<u32>(0)? * 2)).param_token(&base),
///         ),
///     ],
///     None,
///     None,
/// ).unwrap();
///
/// assert_eq!(*injector.get_as::<u32>(&doubled).unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct Factory {
    signature: Signature,
    pub(crate) func: ErasedCtor,
    pub(crate) destroy: Option<DestroyHook>,
    type_name: &'static str,
}

impl Factory {
    pub fn new<T, F>(func: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Args<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let erased: ErasedCtor = Arc::new(move |args: &Args<'_>| -> Result<AnyArc, BoxError> {
            let value = func(args)?;
            Ok(Arc::new(value) as AnyArc)
        });
        Self {
            signature: Signature::new(),
            func: erased,
            destroy: None,
            type_name: std::any::type_name::<T>(),
        }
    }

    signature_builders!();

    /// Registers a destroy hook for the produced value.
    pub fn on_destroy<T, F>(mut self, hook: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.destroy = Some(erase_destroy_hook::<T>(Arc::new(hook)));
        self
    }

    /// Registers [`OnDestroy::on_destroy`] of the produced `T` as the destroy hook.
    pub fn with_destroy_hook<T: OnDestroy>(self) -> Self {
        self.on_destroy::<T, _>(T::on_destroy)
    }

    /// Name of the produced type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Factory({})({})", self.type_name, self.signature)
    }
}

fn erase_destroy_hook<T: Send + Sync + 'static>(hook: Arc<dyn Fn(&T) + Send + Sync>) -> DestroyHook {
    Arc::new(move |obj: &AnyArc| {
        if let Some(value) = obj.downcast_ref::<T>() {
            hook(value);
        }
    })
}
