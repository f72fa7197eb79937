//! Per-operation injectors.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::key::Token;
use crate::provider::{DestroyTracker, ExecutionContext, Injector};
use crate::registration::{AnyArc, Provider};
use crate::traits::ResolverCore;

use super::tokens::CONTEXT;
use super::AppInner;

/// Injectors of one operation.
///
/// The application operation injector holds the application's
/// operation-scoped providers plus the context value, provided under
/// [`CONTEXT`] and under its own type. Its parent is the execution-context
/// shadow of the application injector. Module operation injectors are built
/// on first use; their parent is the shadow of the module injector and
/// their fallback is the application operation injector.
///
/// Destroy hooks run on [`destroy`](Self::destroy) or on drop, whichever
/// comes first.
pub struct OperationContext {
    app: Arc<AppInner>,
    context: AnyArc,
    execution: ExecutionContext,
    injector: Arc<Injector>,
    modules: Mutex<HashMap<String, Arc<Injector>>>,
    tracker: DestroyTracker,
}

impl OperationContext {
    pub(crate) fn start<C: Send + Sync + 'static>(app: Arc<AppInner>, context: Arc<C>) -> DiResult<Self> {
        let execution = ExecutionContext::from_value(context.clone());
        app.ensure_instantiated()?;
        let shadow = Injector::create_with_execution_context(&app.injector, execution.clone())?;

        let mut providers = app.operation_providers.clone();
        providers.push(Provider::provide(&*CONTEXT).use_arc(context.clone()));
        providers.push(Provider::provide(Token::of::<C>()).use_arc(context.clone()));
        let injector = Injector::create(
            format!("{}:operation", app.runtime.name),
            &providers,
            Some(shadow as Arc<dyn ResolverCore>),
            None,
        )?;

        let tracker = DestroyTracker::new();
        tracker.track(&injector);
        tracing::trace!(app = %app.runtime.name, "operation started");

        Ok(Self {
            app,
            context: context as AnyArc,
            execution,
            injector,
            modules: Mutex::new(HashMap::new()),
            tracker,
        })
    }

    /// The application operation injector.
    pub fn injector(&self) -> &Arc<Injector> {
        &self.injector
    }

    /// The context value, if it is a `C`.
    pub fn context<C: Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.context.clone().downcast::<C>().ok()
    }

    /// The execution context handed to context-bound singletons.
    pub fn execution_context(&self) -> &ExecutionContext {
        &self.execution
    }

    /// The operation injector of module `id`, built on first call.
    ///
    /// Fails with [`DiError::OperationDestroyed`] once the operation has been
    /// destroyed, even for a module whose injector was already built.
    pub fn module_injector(&self, id: &str) -> DiResult<Arc<Injector>> {
        if self.tracker.is_destroyed() {
            return Err(DiError::OperationDestroyed);
        }
        if let Some(injector) = self.modules.lock().get(id) {
            return Ok(injector.clone());
        }

        let loaded = self
            .app
            .modules
            .get(id)
            .ok_or_else(|| DiError::UnknownModule(id.to_string()))?;
        loaded.ensure_instantiated()?;
        let shadow = Injector::create_with_execution_context(&loaded.injector, self.execution.clone())?;
        let injector = Injector::create(
            format!("module:{}:operation", id),
            loaded.module.scoped_providers().operation(),
            Some(shadow as Arc<dyn ResolverCore>),
            Some(self.injector.clone() as Arc<dyn ResolverCore>),
        )?;

        let mut modules = self.modules.lock();
        let injector = modules.entry(id.to_string()).or_insert(injector).clone();
        drop(modules);
        self.tracker.track(&injector);
        if self.tracker.is_destroyed() {
            return Err(DiError::OperationDestroyed);
        }
        Ok(injector)
    }

    /// Runs the destroy hooks of this operation. Returns how many ran; a
    /// second call returns 0.
    pub fn destroy(&self) -> usize {
        self.tracker.destroy()
    }

    /// Whether [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.tracker.is_destroyed()
    }
}

impl Drop for OperationContext {
    fn drop(&mut self) {
        self.tracker.destroy();
    }
}

impl fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContext")
            .field("injector", &self.injector.name())
            .field("modules", &self.modules.lock().keys().collect::<Vec<_>>())
            .field("destroyed", &self.tracker.is_destroyed())
            .finish()
    }
}
