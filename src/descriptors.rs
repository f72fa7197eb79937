//! Provider descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::ProviderScope;
use crate::resolution::{Dependency, ResolvedProvider};

/// Snapshot of one provider owned by an injector.
///
/// # Use Cases
///
/// - **Debugging**: see what an injector owns and what it has built so far
/// - **Startup checks**: confirm that eager instantiation covered everything
///
/// # Examples
///
/// ```rust
/// use reflective_di::{Injector, Provider, ProviderScope, Token};
///
/// let config = Token::opaque("config");
/// let request = Token::opaque("request");
/// let injector = Injector::create(
///     "root",
///     &[
///         Provider::provide(&config).use_value(1u8),
///         Provider::provide(&request).use_value(2u8).in_scope(ProviderScope::Operation),
///     ],
///     None,
///     None,
/// ).unwrap();
///
/// injector.instance(&config);
/// let descriptors = injector.descriptors();
/// assert_eq!(descriptors.len(), 2);
/// assert!(descriptors.iter().all(|d| !d.instantiated));
/// assert_eq!(descriptors[1].scope, ProviderScope::Operation);
/// ```
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub key: Key,
    pub scope: ProviderScope,
    pub dependencies: Vec<Dependency>,
    /// Whether the injector has built this provider.
    pub instantiated: bool,
    /// Properties bound to the execution context.
    pub execution_context: Vec<&'static str>,
    pub has_destroy_hook: bool,
    type_name: &'static str,
}

impl ProviderDescriptor {
    pub(crate) fn from_resolved(provider: &ResolvedProvider, instantiated: bool) -> Self {
        Self {
            key: provider.key.clone(),
            scope: provider.scope(),
            dependencies: provider.factory.dependencies.clone(),
            instantiated,
            execution_context: provider.execution_context().to_vec(),
            has_destroy_hook: provider.has_destroy_hook(),
            type_name: provider.type_name(),
        }
    }

    /// Name of the produced type, or `"value"` for value providers.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_context_bound(&self) -> bool {
        !self.execution_context.is_empty()
    }
}
