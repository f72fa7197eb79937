//! Argument context for constructors and factories.
//!
//! This module contains the [`Args`] type which hands the resolved
//! dependencies of a provider to its constructor or factory function.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

/// Resolved arguments passed to constructors and factory functions.
///
/// Positions follow the declared signature. An optional parameter whose
/// token was not provided anywhere holds no value.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use reflective_di::{Factory, Injector, Provider, Resolver, Token};
///
/// struct Database { url: String }
///
/// let url = Token::opaque("url");
/// let cache = Token::opaque("cache");
///
/// let injector = Injector::create(
///     "root",
///     &[
///         Provider::provide(&url).use_value("postgres://localhost".to_string()),
///         Provider::provide(Token::of::<Database>()).use_factory(
///             Factory::new(|args| {
///                 // args is an Args that holds the resolved dependencies
///                 let url: Arc<String> = args.get(0)?;
///                 assert!(args.optional::<String>(1)?.is_none());
///                 Ok(Database { url: url.to_string() })
///             })
///             .param_token(&url)
///             .param_token(&cache)
///             .optional(1),
///         ),
///     ],
///     None,
///     None,
/// ).unwrap();
///
/// assert_eq!(injector.get::<Database>().unwrap().url, "postgres://localhost");
/// ```
pub struct Args<'a> {
    owner: &'a str,
    values: &'a [Option<AnyArc>],
}

impl<'a> Args<'a> {
    pub(crate) fn new(owner: &'a str, values: &'a [Option<AnyArc>]) -> Self {
        Self { owner, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The argument at `index`, downcast to `T`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        self.optional(index)?.ok_or_else(|| DiError::MissingArgument {
            index,
            owner: self.owner.to_string(),
        })
    }

    /// The argument at `index`, or `None` for an absent optional dependency.
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Option<Arc<T>>> {
        match self.raw(index) {
            Some(value) => value
                .downcast::<T>()
                .map(Some)
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>())),
            None => Ok(None),
        }
    }

    /// The untyped argument at `index`.
    pub fn raw(&self, index: usize) -> Option<AnyArc> {
        self.values.get(index).and_then(Clone::clone)
    }
}
