//! Provider scopes and the singleton/operation split.

use crate::registration::Provider;

/// Lifetime class of a provider.
///
/// - **Singleton**: built into the application (or module) injector once and
///   shared by every operation. This is the default.
/// - **Operation**: built into the short-lived injector created for each
///   request and dropped with it.
///
/// ```rust
/// use reflective_di::{Provider, ProviderScope, ScopedProviders, Token};
///
/// let providers = vec![
///     Provider::provide(Token::opaque("config")).use_value(1u8),
///     Provider::provide(Token::opaque("request-id"))
///         .use_value(7u64)
///         .in_scope(ProviderScope::Operation),
/// ];
///
/// let split = ScopedProviders::partition(&providers);
/// assert_eq!(split.singleton().len(), 1);
/// assert_eq!(split.operation().len(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum ProviderScope {
    #[default]
    Singleton,
    Operation,
}

impl std::fmt::Display for ProviderScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderScope::Singleton => f.write_str("singleton"),
            ProviderScope::Operation => f.write_str("operation"),
        }
    }
}

/// Provider declarations split by scope.
///
/// The split is a pure function of static configuration, so it is computed
/// once when an application or module is assembled and reused for every
/// operation afterwards. Groups are flattened; declaration order is kept
/// inside each half.
#[derive(Clone, Debug, Default)]
pub struct ScopedProviders {
    singleton: Vec<Provider>,
    operation: Vec<Provider>,
}

impl ScopedProviders {
    pub fn partition(providers: &[Provider]) -> Self {
        let mut split = Self::default();
        for provider in providers {
            split.push(provider);
        }
        split
    }

    fn push(&mut self, provider: &Provider) {
        match provider {
            Provider::Group(children) => {
                for child in children {
                    self.push(child);
                }
            }
            leaf => match leaf.scope() {
                ProviderScope::Singleton => self.singleton.push(leaf.clone()),
                ProviderScope::Operation => self.operation.push(leaf.clone()),
            },
        }
    }

    pub fn singleton(&self) -> &[Provider] {
        &self.singleton
    }

    pub fn operation(&self) -> &[Provider] {
        &self.operation
    }

    pub fn is_empty(&self) -> bool {
        self.singleton.is_empty() && self.operation.is_empty()
    }
}

/// Providers that belong in an application-lived injector.
pub fn only_singleton_providers(providers: &[Provider]) -> Vec<Provider> {
    ScopedProviders::partition(providers).singleton
}

/// Providers that belong in a per-operation injector.
pub fn only_operation_providers(providers: &[Provider]) -> Vec<Provider> {
    ScopedProviders::partition(providers).operation
}
