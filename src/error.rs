//! Error types for the injector.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::key::Key;

/// Boxed error returned by user factories and constructors.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shared form of a factory error, kept so `DiError` stays `Clone`.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Chain of keys that led to a lookup-time failure.
///
/// The first key is the token that failed; every frame that was resolving a
/// dependency when the failure propagated appends its own key. The injector
/// recorded is the one where the failure originated.
#[derive(Debug, Clone)]
pub struct ResolutionPath {
    keys: Vec<Key>,
    injector: String,
}

impl ResolutionPath {
    pub(crate) fn new(injector: impl Into<String>, key: Key) -> Self {
        Self {
            keys: vec![key],
            injector: injector.into(),
        }
    }

    pub(crate) fn push(&mut self, key: Key) {
        self.keys.push(key);
    }

    /// The key that could not be produced.
    pub fn key(&self) -> &Key {
        &self.keys[0]
    }

    /// Keys in propagation order (failing key first).
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Display name of the injector where the failure originated.
    pub fn injector(&self) -> &str {
        &self.injector
    }

    /// Keys from the outermost request down to the failure, cut after the
    /// first repeated key.
    pub fn chain(&self) -> Vec<Key> {
        let mut chain: Vec<Key> = Vec::with_capacity(self.keys.len());
        for key in self.keys.iter().rev() {
            let closes_cycle = chain.contains(key);
            chain.push(key.clone());
            if closes_cycle {
                break;
            }
        }
        chain
    }

    fn suffix(&self) -> String {
        if self.keys.len() > 1 {
            format!(" ({})", self)
        } else {
            String::new()
        }
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain().iter().map(Key::display_name).collect();
        f.write_str(&names.join(" -> "))
    }
}

/// Dependency injection errors
///
/// Declaration errors (`InvalidProvider`, `NoAnnotation`) surface when an
/// injector is built. Lookup errors (`NoProvider`, `CyclicDependency`,
/// `Instantiation`) surface from `get` and carry the resolution path.
///
/// ```rust
/// use reflective_di::{DiError, Injector, Resolver};
///
/// struct Missing;
///
/// let injector = Injector::create("root", &[], None, None).unwrap();
/// match injector.get::<Missing>() {
///     Err(DiError::NoProvider(path)) => {
///         assert!(path.key().display_name().ends_with("Missing"));
///         assert_eq!(path.injector(), "root");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// A declaration that is neither a class, a value, nor a factory.
    #[error("Invalid provider - only classes, values and factories are allowed, got: {0}")]
    InvalidProvider(String),

    /// A constructor or factory parameter without a resolvable token.
    #[error(
        "Cannot resolve all parameters for '{type_name}'({signature}). Make sure that all the \
         parameters are declared with a token and that '{type_name}' has injectable metadata."
    )]
    NoAnnotation {
        type_name: String,
        signature: String,
        position: usize,
    },

    /// Nothing along the injector chain provides the token.
    #[error("No provider for {}!{} - in {}", .0.key(), .0.suffix(), .0.injector())]
    NoProvider(ResolutionPath),

    /// Re-entrant instantiation on one injector.
    #[error("Cannot instantiate cyclic dependency!{} - in {}", .0.suffix(), .0.injector())]
    CyclicDependency(ResolutionPath),

    /// A factory or constructor returned an error.
    #[error(
        "{source}: Error during instantiation of {}!{} - in {}",
        .path.key(),
        .path.suffix(),
        .path.injector()
    )]
    Instantiation {
        path: ResolutionPath,
        #[source]
        source: SharedError,
    },

    /// A factory asked for an argument that was not resolved.
    #[error("No value for argument {index} of {owner}")]
    MissingArgument { index: usize, owner: String },

    /// A resolved value could not be downcast to the requested type.
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),

    /// An execution-context view was requested for an object that was never built.
    #[error(
        "Cannot create execution context view of {token}: it has not been instantiated in \
         {injector} (call instantiate_all first)"
    )]
    NotInstantiated { token: String, injector: String },

    /// Two modules with the same id in one application.
    #[error("Module \"{0}\" already exists")]
    ModuleDuplicated(String),

    #[error("Module \"{0}\" is not part of this application")]
    UnknownModule(String),

    /// A module injector was requested from an operation after its destroy hooks ran.
    #[error("Operation has already been destroyed")]
    OperationDestroyed,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiError {
    pub(crate) fn no_provider(injector: &str, key: Key) -> Self {
        DiError::NoProvider(ResolutionPath::new(injector, key))
    }

    pub(crate) fn cyclic(injector: &str, key: Key) -> Self {
        DiError::CyclicDependency(ResolutionPath::new(injector, key))
    }

    pub(crate) fn instantiation(injector: &str, key: Key, source: BoxError) -> Self {
        DiError::Instantiation {
            path: ResolutionPath::new(injector, key),
            source: Arc::from(source),
        }
    }

    /// Appends the key of a dependent that was being resolved when this
    /// error propagated. Declaration errors are left untouched.
    pub(crate) fn add_key(&mut self, key: Key) {
        match self {
            DiError::NoProvider(path)
            | DiError::CyclicDependency(path)
            | DiError::Instantiation { path, .. } => path.push(key),
            _ => {}
        }
    }

    /// The error returned by the failing factory, for `Instantiation` errors.
    pub fn original_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            DiError::Instantiation { source, .. } => Some(&**source),
            _ => None,
        }
    }

    /// The resolution path for lookup-time errors.
    pub fn resolution_path(&self) -> Option<&ResolutionPath> {
        match self {
            DiError::NoProvider(path)
            | DiError::CyclicDependency(path)
            | DiError::Instantiation { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
