use reflective_di::{
    AnyArc, DiError, DiResult, Factory, Injector, Key, Provider, Resolver, ResolverCore, Token,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_child_shadows_parent() {
    let token = Token::opaque("name");
    let parent = Injector::create(
        "parent",
        &[Provider::provide(&token).use_factory(Factory::new(|_| Ok("parent".to_string())))],
        None,
        None,
    )
    .unwrap();
    let child = Injector::create(
        "child",
        &[Provider::provide(&token).use_factory(Factory::new(|_| Ok("child".to_string())))],
        Some(parent.clone()),
        None,
    )
    .unwrap();

    let from_child = child.get_as::<String>(&token).unwrap();
    let from_parent = parent.get_as::<String>(&token).unwrap();
    assert_eq!(*from_child, "child");
    assert_eq!(*from_parent, "parent");
    assert!(!Arc::ptr_eq(&from_child, &from_parent));
}

#[test]
fn test_parent_instances_are_shared_with_children() {
    let token = Token::opaque("shared");
    let parent = Injector::create(
        "parent",
        &[Provider::provide(&token).use_factory(Factory::new(|_| Ok(vec![1u8, 2, 3])))],
        None,
        None,
    )
    .unwrap();
    let a = Injector::create("a", &[], Some(parent.clone()), None).unwrap();
    let b = Injector::create("b", &[], Some(parent.clone()), None).unwrap();

    let from_a = a.get_as::<Vec<u8>>(&token).unwrap();
    let from_b = b.get_as::<Vec<u8>>(&token).unwrap();
    assert!(Arc::ptr_eq(&from_a, &from_b));
    assert!(parent.is_instantiated(&token));
    assert!(!a.is_instantiated(&token));
}

#[test]
fn test_dependencies_resolve_from_owning_injector() {
    // A provider found in the parent is built by the parent, so it cannot
    // see providers that only exist in the child.
    let greeting = Token::opaque("greeting");
    let name = Token::opaque("name");

    let parent = Injector::create(
        "parent",
        &[Provider::provide(&greeting).use_factory(
            Factory::new(|args| Ok(format!("hello {}", args.get::<&str>(0)?))).param_token(&name),
        )],
        None,
        None,
    )
    .unwrap();
    let child = Injector::create(
        "child",
        &[Provider::provide(&name).use_value("child")],
        Some(parent.clone()),
        None,
    )
    .unwrap();

    let err = child.get_as::<String>(&greeting).unwrap_err();
    let path = err.resolution_path().unwrap();
    assert!(matches!(err, DiError::NoProvider(_)));
    assert_eq!(path.key(), &Key::get(&name));
    assert_eq!(path.injector(), "parent");
}

#[test]
fn test_fallback_is_consulted_after_parent_chain() {
    let only_in_fallback = Token::opaque("only-in-fallback");
    let in_both = Token::opaque("in-both");

    let parent = Injector::create(
        "parent",
        &[Provider::provide(&in_both).use_value("parent")],
        None,
        None,
    )
    .unwrap();
    let fallback = Injector::create(
        "fallback",
        &[
            Provider::provide(&in_both).use_value("fallback"),
            Provider::provide(&only_in_fallback).use_value("fallback"),
        ],
        None,
        None,
    )
    .unwrap();
    let injector = Injector::create("injector", &[], Some(parent), Some(fallback.clone())).unwrap();

    assert_eq!(*injector.get_as::<&str>(&in_both).unwrap(), "parent");
    assert_eq!(*injector.get_as::<&str>(&only_in_fallback).unwrap(), "fallback");
    assert!(fallback.is_instantiated(&only_in_fallback));
    assert!(!fallback.is_instantiated(&in_both));
}

#[test]
fn test_fallback_walks_its_parents() {
    let token = Token::opaque("deep");
    let root = Injector::create(
        "root",
        &[Provider::provide(&token).use_value(5u8)],
        None,
        None,
    )
    .unwrap();
    let fallback = Injector::create("fallback", &[], Some(root), None).unwrap();
    let injector = Injector::create("injector", &[], None, Some(fallback)).unwrap();

    assert_eq!(*injector.get_as::<u8>(&token).unwrap(), 5);
}

#[test]
fn test_not_found_error_names_requesting_injector() {
    let parent = Injector::create("parent", &[], None, None).unwrap();
    let fallback = Injector::create("fallback", &[], None, None).unwrap();
    let injector = Injector::create("injector", &[], Some(parent), Some(fallback)).unwrap();

    let err = injector.get_any(Token::opaque("nowhere")).unwrap_err();
    assert_eq!(err.resolution_path().unwrap().injector(), "injector");
    assert!(err.to_string().ends_with(" - in injector"));
}

/// Non-reflective container used as the top of a chain.
struct External {
    values: HashMap<Key, AnyArc>,
    calls: AtomicUsize,
}

impl ResolverCore for External {
    fn resolve_key(&self, key: &Key, optional: bool) -> DiResult<Option<AnyArc>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.values.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None if optional => Ok(None),
            None => Err(DiError::Config(format!("external has no {}", key))),
        }
    }

    fn display_name(&self) -> String {
        "external".to_string()
    }
}

#[test]
fn test_external_terminal_parent() {
    let token = Token::opaque("external-value");
    let missing = Token::opaque("missing");
    let mut values: HashMap<Key, AnyArc> = HashMap::new();
    values.insert(Key::get(&token), Arc::new(99u32));
    let external = Arc::new(External {
        values,
        calls: AtomicUsize::new(0),
    });

    let parent = Injector::create("parent", &[], Some(external.clone()), None).unwrap();
    let child = Injector::create("child", &[], Some(parent), None).unwrap();

    assert_eq!(*child.get_as::<u32>(&token).unwrap(), 99);

    // The terminal is probed, then the requesting injector reports the miss.
    let err = child.get_any(&missing).unwrap_err();
    assert!(matches!(err, DiError::NoProvider(_)));
    assert_eq!(err.resolution_path().unwrap().injector(), "child");
    assert_eq!(external.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_external_resolver_gets_typed_api() {
    let token = Token::opaque("typed");
    let mut values: HashMap<Key, AnyArc> = HashMap::new();
    values.insert(Key::get(&token), Arc::new("value".to_string()));
    let external: Arc<dyn ResolverCore> = Arc::new(External {
        values,
        calls: AtomicUsize::new(0),
    });

    assert_eq!(*external.get_as::<String>(&token).unwrap(), "value");
    assert!(external.try_get_as::<String>(Token::opaque("other")).unwrap().is_none());
}
