//! Provider normalization and dependency extraction.
//!
//! [`resolve_providers`] turns user declarations into [`ResolvedProvider`]s:
//! groups are flattened, every entry gets a factory plus its ordered
//! dependency keys, and later declarations for the same token replace
//! earlier ones.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, DiError, DiResult};
use crate::key::{Key, Token};
use crate::lifetime::ProviderScope;
use crate::metadata::{ClassRef, ContextualWrap, DestroyHook, ErasedCtor, Signature};
use crate::provider::context::Args;
use crate::registration::{AnyArc, Provider, ProviderDecl, Strategy};

/// A dependency of a resolved provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub key: Key,
    pub optional: bool,
}

/// Factory plus the dependencies it is called with, in parameter order.
#[derive(Clone)]
pub struct ResolvedFactory {
    pub(crate) factory: ErasedCtor,
    pub dependencies: Vec<Dependency>,
}

impl fmt::Debug for ResolvedFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFactory")
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

#[derive(Clone)]
pub(crate) struct ProviderMeta {
    pub(crate) scope: ProviderScope,
    pub(crate) type_name: &'static str,
    pub(crate) execution_context: Arc<[&'static str]>,
    pub(crate) destroy: Option<DestroyHook>,
    pub(crate) contextual: Option<(Token, ContextualWrap)>,
}

/// A provider ready to be owned by an injector.
#[derive(Clone)]
pub struct ResolvedProvider {
    pub key: Key,
    pub factory: ResolvedFactory,
    pub(crate) meta: ProviderMeta,
}

impl ResolvedProvider {
    pub fn scope(&self) -> ProviderScope {
        self.meta.scope
    }

    /// Properties bound to the execution context, empty for most providers.
    pub fn execution_context(&self) -> &[&'static str] {
        &self.meta.execution_context
    }

    pub fn has_destroy_hook(&self) -> bool {
        self.meta.destroy.is_some()
    }

    /// Name of the produced type, or of the token for value providers.
    pub fn type_name(&self) -> &'static str {
        self.meta.type_name
    }
}

impl fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("key", &self.key)
            .field("scope", &self.meta.scope)
            .field("dependencies", &self.factory.dependencies)
            .finish()
    }
}

/// Flattens groups and checks that every declaration has a strategy.
pub fn normalize_providers(providers: &[Provider]) -> DiResult<Vec<ProviderDecl>> {
    let mut out = Vec::with_capacity(providers.len());
    normalize_into(providers, &mut out)?;
    Ok(out)
}

fn normalize_into(providers: &[Provider], out: &mut Vec<ProviderDecl>) -> DiResult<()> {
    for provider in providers {
        match provider {
            Provider::Type(class) => out.push(ProviderDecl {
                provide: class.token().into(),
                strategy: Some(Strategy::Class(class.clone())),
                scope: None,
            }),
            Provider::Declared(decl) => {
                if decl.strategy.is_none() {
                    return Err(DiError::InvalidProvider(format!("{:?}", decl)));
                }
                out.push(decl.clone());
            }
            Provider::Group(children) => normalize_into(children, out)?,
        }
    }
    Ok(())
}

/// Resolves declarations into providers keyed by the global registry.
///
/// Fails with `InvalidProvider` for a declaration without a strategy and
/// with `NoAnnotation` for a signature with an unresolvable parameter.
pub fn resolve_providers(providers: &[Provider]) -> DiResult<Vec<ResolvedProvider>> {
    let resolved = normalize_providers(providers)?
        .iter()
        .map(resolve_provider)
        .collect::<DiResult<Vec<_>>>()?;
    Ok(merge_resolved_providers(resolved))
}

/// Resolves one normalized declaration.
pub fn resolve_provider(decl: &ProviderDecl) -> DiResult<ResolvedProvider> {
    let strategy = decl
        .strategy
        .as_ref()
        .ok_or_else(|| DiError::InvalidProvider(format!("{:?}", decl)))?;
    let key = Key::get(decl.provide.clone());
    let scope = decl.effective_scope();

    let provider = match strategy {
        Strategy::Value(value) => value_provider(key, value.clone(), "value", scope),
        Strategy::Class(class) => resolve_class(key, class, scope)?,
        Strategy::Factory(factory) => ResolvedProvider {
            meta: ProviderMeta {
                scope,
                type_name: factory.type_name(),
                execution_context: Arc::from(Vec::new()),
                destroy: factory.destroy.clone(),
                contextual: None,
            },
            factory: ResolvedFactory {
                factory: factory.func.clone(),
                dependencies: dependencies_for(factory.type_name(), factory.signature())?,
            },
            key,
        },
    };
    Ok(provider)
}

fn resolve_class(key: Key, class: &ClassRef, scope: ProviderScope) -> DiResult<ResolvedProvider> {
    let info = &class.info;
    let contextual = if info.execution_context.is_empty() {
        None
    } else {
        Some((info.contextual_token.clone(), info.contextual.clone()))
    };
    Ok(ResolvedProvider {
        factory: ResolvedFactory {
            factory: info.ctor.clone(),
            dependencies: dependencies_for(info.type_name, &info.signature)?,
        },
        meta: ProviderMeta {
            scope,
            type_name: info.type_name,
            execution_context: info.execution_context.clone(),
            destroy: info.destroy.clone(),
            contextual,
        },
        key,
    })
}

/// Ordered dependencies of a signature. Forward references are resolved here.
pub fn dependencies_for(type_name: &str, signature: &Signature) -> DiResult<Vec<Dependency>> {
    signature
        .params()
        .iter()
        .enumerate()
        .map(|(position, param)| match &param.token {
            Some(token) => Ok(Dependency {
                key: Key::get(token.clone()),
                optional: param.optional,
            }),
            None => Err(DiError::NoAnnotation {
                type_name: type_name.to_string(),
                signature: signature.to_string(),
                position,
            }),
        })
        .collect()
}

/// Last write wins; a replaced provider keeps its original position.
pub fn merge_resolved_providers(providers: Vec<ResolvedProvider>) -> Vec<ResolvedProvider> {
    let mut positions: HashMap<usize, usize> = HashMap::with_capacity(providers.len());
    let mut merged: Vec<ResolvedProvider> = Vec::with_capacity(providers.len());
    for provider in providers {
        match positions.get(&provider.key.id()) {
            Some(&at) => merged[at] = provider,
            None => {
                positions.insert(provider.key.id(), merged.len());
                merged.push(provider);
            }
        }
    }
    merged
}

pub(crate) fn value_provider(
    key: Key,
    value: AnyArc,
    type_name: &'static str,
    scope: ProviderScope,
) -> ResolvedProvider {
    let factory: ErasedCtor =
        Arc::new(move |_: &Args<'_>| -> Result<AnyArc, BoxError> { Ok(value.clone()) });
    ResolvedProvider {
        key,
        factory: ResolvedFactory {
            factory,
            dependencies: Vec::new(),
        },
        meta: ProviderMeta {
            scope,
            type_name,
            execution_context: Arc::from(Vec::new()),
            destroy: None,
            contextual: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Factory, Injectable, InjectableMetadata};

    struct Plain;

    impl Injectable for Plain {
        fn metadata() -> InjectableMetadata<Self> {
            InjectableMetadata::new(|_| Ok(Plain))
        }
    }

    struct Broken;

    impl Injectable for Broken {
        fn metadata() -> InjectableMetadata<Self> {
            InjectableMetadata::new(|_| Ok(Broken))
                .param::<Plain>()
                .unannotated()
                .param::<Plain>()
        }
    }

    #[test]
    fn bare_class_is_provided_under_its_own_token() {
        let resolved = resolve_providers(&[Provider::class::<Plain>()]).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].key, Key::of::<Plain>());
        assert!(resolved[0].factory.dependencies.is_empty());
    }

    #[test]
    fn groups_are_flattened() {
        let a = Token::opaque("a");
        let b = Token::opaque("b");
        let resolved = resolve_providers(&[Provider::group([
            Provider::provide(&a).use_value(1u8),
            Provider::group([Provider::provide(&b).use_value(2u8)]),
        ])])
        .unwrap();
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn later_declaration_replaces_earlier_in_place() {
        let a = Token::opaque("a");
        let b = Token::opaque("b");
        let resolved = resolve_providers(&[
            Provider::provide(&a).use_value(1u8),
            Provider::provide(&b).use_value(2u8),
            Provider::provide(&a).use_value(3u8).in_scope(ProviderScope::Operation),
        ])
        .unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].key, Key::get(&a));
        assert_eq!(resolved[0].scope(), ProviderScope::Operation);
    }

    #[test]
    fn declaration_without_strategy_is_invalid() {
        let decl = Provider::provide(Token::opaque("lonely"));
        let err = resolve_providers(&[decl.into()]).unwrap_err();
        match err {
            DiError::InvalidProvider(text) => assert!(text.contains("lonely")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unannotated_parameter_is_reported_with_position() {
        let err = resolve_providers(&[Provider::class::<Broken>()]).unwrap_err();
        match err {
            DiError::NoAnnotation {
                type_name,
                signature,
                position,
            } => {
                assert!(type_name.ends_with("Broken"));
                assert_eq!(position, 1);
                assert!(signature.contains(", ?, "));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn inject_overrides_unannotated_parameter() {
        let token = Token::opaque("explicit");
        let factory = Factory::new(|_| Ok(0u8)).unannotated().inject(0, &token).optional(0);
        let deps = dependencies_for("factory", factory.signature()).unwrap();
        assert_eq!(
            deps,
            vec![Dependency {
                key: Key::get(&token),
                optional: true
            }]
        );
    }
}
