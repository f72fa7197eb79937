//! Applications and modules.
//!
//! An [`Application`] owns one singleton injector built from its own
//! providers and one singleton injector per [`Module`], each a child of the
//! application injector. Operation-scoped providers are kept aside and
//! instantiated per operation by [`OperationContext`].
//!
//! ```text
//! app injector <- module:<id> injector
//!      ^                 ^
//!  app shadow       module shadow
//!      ^                 ^
//! app operation <·· module operation   (·· = fallback)
//! ```
//!
//! # Examples
//!
//! ```
//! use reflective_di::{
//!     AppConfig, Application, Factory, Module, Provider, ProviderScope, Resolver, Token, MODULE_ID,
//! };
//!
//! struct Request { user: &'static str }
//!
//! let greeting = Token::opaque("greeting");
//! let users = Module::new("users").with_providers([
//!     Provider::provide(&greeting)
//!         .scope(ProviderScope::Operation)
//!         .use_factory(
//!             Factory::new(|args| {
//!                 let request = args.get::<Request>(0)?;
//!                 Ok(format!("hello {}", request.user))
//!             })
//!             .param::<Request>(),
//!         ),
//! ]);
//!
//! let app = Application::create(AppConfig::new().module(users)).unwrap();
//! let operation = app.operation(Request { user: "ada" }).unwrap();
//! let injector = operation.module_injector("users").unwrap();
//!
//! assert_eq!(*injector.get_as::<String>(&greeting).unwrap(), "hello ada");
//! assert_eq!(*injector.get_token(&*MODULE_ID).unwrap(), "users");
//! ```

mod operation;
pub mod tokens;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::RuntimeConfig;
use crate::error::{DiError, DiResult};
use crate::lifetime::ScopedProviders;
use crate::observer::TracingObserver;
use crate::provider::Injector;
use crate::registration::Provider;

pub use operation::OperationContext;
use tokens::MODULE_ID;

/// A named group of providers with its own singleton injector.
#[derive(Clone, Debug)]
pub struct Module {
    id: String,
    providers: Vec<Provider>,
    scoped: ScopedProviders,
}

impl Module {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            providers: Vec::new(),
            scoped: ScopedProviders::default(),
        }
    }

    pub fn with_providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self.scoped = ScopedProviders::partition(&self.providers);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Providers split by scope, computed when the providers were set.
    pub fn scoped_providers(&self) -> &ScopedProviders {
        &self.scoped
    }
}

/// Input of [`Application::create`].
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub modules: Vec<Module>,
    pub providers: Vec<Provider>,
    pub runtime: RuntimeConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    pub fn provider(mut self, provider: impl Into<Provider>) -> Self {
        self.providers.push(provider.into());
        self
    }

    pub fn runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }
}

pub(crate) struct LoadedModule {
    pub(crate) module: Module,
    pub(crate) injector: Arc<Injector>,
    warmed: OnceCell<()>,
}

impl LoadedModule {
    /// Instantiates the module singletons on the first call only.
    pub(crate) fn ensure_instantiated(&self) -> DiResult<()> {
        self.warmed.get_or_try_init(|| self.injector.instantiate_all())?;
        Ok(())
    }
}

pub(crate) struct AppInner {
    pub(crate) injector: Arc<Injector>,
    warmed: OnceCell<()>,
    pub(crate) operation_providers: Vec<Provider>,
    pub(crate) modules: HashMap<String, LoadedModule>,
    pub(crate) order: Vec<String>,
    pub(crate) runtime: RuntimeConfig,
}

impl AppInner {
    /// Instantiates the application singletons on the first call only.
    pub(crate) fn ensure_instantiated(&self) -> DiResult<()> {
        self.warmed.get_or_try_init(|| self.injector.instantiate_all())?;
        Ok(())
    }
}

/// Runs `instantiate_all` now when `eager`, and returns a cell recording
/// whether it still has to run.
fn instantiate_eagerly(injector: &Injector, eager: bool) -> DiResult<OnceCell<()>> {
    if eager {
        injector.instantiate_all()?;
        Ok(OnceCell::with_value(()))
    } else {
        Ok(OnceCell::new())
    }
}

/// Application-wide injectors, shared by every operation.
#[derive(Clone)]
pub struct Application {
    inner: Arc<AppInner>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("injector", &self.inner.injector.name())
            .field("modules", &self.inner.order)
            .finish()
    }
}

impl Application {
    /// Builds the application injector and every module injector.
    ///
    /// Duplicate module ids fail with [`DiError::ModuleDuplicated`] before any
    /// injector is built. With `eager_instantiation` on, every singleton is
    /// constructed here and errors abort startup.
    pub fn create(config: AppConfig) -> DiResult<Self> {
        let AppConfig {
            modules,
            providers,
            runtime,
        } = config;

        let mut order = Vec::with_capacity(modules.len());
        for module in &modules {
            if order.iter().any(|id| id == module.id()) {
                return Err(DiError::ModuleDuplicated(module.id().to_string()));
            }
            order.push(module.id().to_string());
        }

        let scoped = ScopedProviders::partition(&providers);
        let mut builder = Injector::builder(runtime.name.clone()).providers(scoped.singleton().to_vec());
        if runtime.trace_resolution {
            builder = builder.observer(Arc::new(TracingObserver::new()));
        }
        let injector = builder.build()?;
        let warmed = instantiate_eagerly(&injector, runtime.eager_instantiation)?;

        let mut loaded = HashMap::with_capacity(modules.len());
        for module in modules {
            let module_injector = Injector::builder(format!("module:{}", module.id()))
                .providers(module.scoped_providers().singleton().to_vec())
                .provider(Provider::provide(&*MODULE_ID).use_value(module.id().to_string()))
                .parent(injector.clone())
                .build()?;
            let warmed = instantiate_eagerly(&module_injector, runtime.eager_instantiation)?;
            loaded.insert(
                module.id().to_string(),
                LoadedModule {
                    module,
                    injector: module_injector,
                    warmed,
                },
            );
        }

        tracing::debug!(app = %runtime.name, modules = order.len(), "application created");

        Ok(Self {
            inner: Arc::new(AppInner {
                injector,
                warmed,
                operation_providers: scoped.operation().to_vec(),
                modules: loaded,
                order,
                runtime,
            }),
        })
    }

    /// The application singleton injector.
    pub fn injector(&self) -> &Arc<Injector> {
        &self.inner.injector
    }

    /// The singleton injector of module `id`.
    pub fn module_injector(&self, id: &str) -> Option<&Arc<Injector>> {
        self.inner.modules.get(id).map(|m| &m.injector)
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.inner.modules.get(id).map(|m| &m.module)
    }

    /// Module ids in declaration order.
    pub fn module_ids(&self) -> &[String] {
        &self.inner.order
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.inner.runtime
    }

    /// Starts an operation whose context value is `context`.
    pub fn operation<C: Send + Sync + 'static>(&self, context: C) -> DiResult<OperationContext> {
        OperationContext::start(self.inner.clone(), Arc::new(context))
    }
}
