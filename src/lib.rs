//! # reflective-di
//!
//! Hierarchical dependency injection with singleton and per-operation scopes.
//!
//! ## Features
//!
//! - **Identity tokens**: types, opaque injection tokens and forward references
//! - **Lazy, memoized injectors**: every provider is built at most once per injector
//! - **Parent and fallback chains**: child injectors shadow their parents
//! - **Cyclic dependency detection** with the full resolution path in the error
//! - **Operation scope**: short-lived injectors per request with destroy hooks
//! - **Execution context**: singletons read the context of the operation in flight
//!
//! ## Quick Start
//!
//! ```rust
//! use reflective_di::{Injectable, InjectableMetadata, Injector, Provider, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! impl Injectable for Database {
//!     fn metadata() -> InjectableMetadata<Self> {
//!         InjectableMetadata::new(|_| {
//!             Ok(Database { connection_string: "postgres://localhost".to_string() })
//!         })
//!     }
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn metadata() -> InjectableMetadata<Self> {
//!         InjectableMetadata::new(|args| Ok(UserService { db: args.get(0)? }))
//!             .param::<Database>()
//!     }
//! }
//!
//! let injector = Injector::create(
//!     "app",
//!     &[Provider::class::<Database>(), Provider::class::<UserService>()],
//!     None,
//!     None,
//! ).unwrap();
//!
//! let users = injector.get::<UserService>().unwrap();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! assert!(Arc::ptr_eq(&users, &injector.get::<UserService>().unwrap()));
//! ```
//!
//! ## Scopes
//!
//! - **Singleton**: built once in the application (or module) injector
//! - **Operation**: built once per operation, destroyed when it completes
//!
//! See [`Application`] for the injector tree built around them.
//!
//! ## Errors
//!
//! Declaration mistakes fail when an injector is created; lookups fail with
//! [`DiError::NoProvider`], [`DiError::CyclicDependency`] or
//! [`DiError::Instantiation`], each naming the chain of tokens that led there.
//!
//! ```rust
//! use reflective_di::{DiError, Injectable, InjectableMetadata, Injector, Provider, Resolver};
//!
//! struct A;
//! struct B;
//!
//! impl Injectable for A {
//!     fn metadata() -> InjectableMetadata<Self> {
//!         InjectableMetadata::new(|_| Ok(A)).param::<B>()
//!     }
//! }
//!
//! impl Injectable for B {
//!     fn metadata() -> InjectableMetadata<Self> {
//!         InjectableMetadata::new(|_| Ok(B)).param::<A>()
//!     }
//! }
//!
//! let injector = Injector::create(
//!     "app",
//!     &[Provider::class::<A>(), Provider::class::<B>()],
//!     None,
//!     None,
//! ).unwrap();
//!
//! assert!(matches!(injector.get::<A>(), Err(DiError::CyclicDependency(_))));
//! ```

// Module declarations
pub mod app;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod metadata;
pub mod observer;
pub mod provider;
pub mod resolution;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use app::tokens::{CONTEXT, MODULE_ID};
pub use app::{AppConfig, Application, Module, OperationContext};
pub use config::RuntimeConfig;
pub use descriptors::ProviderDescriptor;
pub use error::{BoxError, DiError, DiResult, ResolutionPath};
pub use key::{ForwardRef, InjectionToken, Key, KeyRegistry, Token, TokenRef};
pub use lifetime::{only_operation_providers, only_singleton_providers, ProviderScope, ScopedProviders};
pub use metadata::{ClassRef, Factory, Injectable, InjectableMetadata, ParamMeta, Signature};
pub use observer::{InjectorObserver, TracingObserver};
pub use provider::{
    Args, Contextual, DestroyTracker, ExecutionContext, Injector, InjectorBuilder,
};
pub use registration::{AnyArc, Provider, ProviderDecl, Strategy};
pub use resolution::{
    resolve_providers, Dependency, ResolvedFactory, ResolvedProvider,
};
pub use traits::{OnDestroy, Resolver, ResolverCore};
