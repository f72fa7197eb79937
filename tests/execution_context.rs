use reflective_di::{
    AnyArc, Contextual, DiError, ExecutionContext, Injectable, InjectableMetadata, Injector,
    Provider, Resolver, Token,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Session {
    label: &'static str,
}

impl Injectable for Session {
    fn metadata() -> InjectableMetadata<Self> {
        InjectableMetadata::new(|_| Ok(Session { label: "shared" }))
            .execution_context("request")
            .execution_context("request")
    }
}

struct Plain;

impl Injectable for Plain {
    fn metadata() -> InjectableMetadata<Self> {
        InjectableMetadata::new(|_| Ok(Plain))
    }
}

fn app() -> Arc<Injector> {
    Injector::create(
        "app",
        &[Provider::class::<Session>(), Provider::class::<Plain>()],
        None,
        None,
    )
    .unwrap()
}

#[test]
fn test_two_contexts_see_their_own_values() {
    let app = app();
    app.instantiate_all().unwrap();

    let first = Injector::create_with_execution_context(&app, ExecutionContext::from_value(Arc::new(1u32))).unwrap();
    let second = Injector::create_with_execution_context(&app, ExecutionContext::from_value(Arc::new(2u32))).unwrap();

    let a = first.get_contextual::<Session>().unwrap();
    let b = second.get_contextual::<Session>().unwrap();

    assert!(Arc::ptr_eq(a.inner(), b.inner()));
    assert!(Arc::ptr_eq(a.inner(), &app.get::<Session>().unwrap()));
    assert_eq!(a.label, "shared");
    assert_eq!(*a.bound_as::<u32>("request").unwrap(), 1);
    assert_eq!(*b.bound_as::<u32>("request").unwrap(), 2);
}

#[test]
fn test_shadow_shares_unmarked_instances() {
    let app = app();
    app.instantiate_all().unwrap();

    let shadow = Injector::create_with_execution_context(&app, ExecutionContext::from_value(Arc::new(()))).unwrap();
    assert_eq!(shadow.name(), "app:execution-context");
    assert_eq!(shadow.providers().len(), 1);

    assert!(Arc::ptr_eq(&shadow.get::<Plain>().unwrap(), &app.get::<Plain>().unwrap()));
    assert!(Arc::ptr_eq(&shadow.get::<Session>().unwrap(), &app.get::<Session>().unwrap()));
    assert!(shadow.try_get::<Contextual<Plain>>().unwrap().is_none());
}

#[test]
fn test_unmarked_properties_are_not_bound() {
    let app = app();
    app.instantiate_all().unwrap();

    let shadow = Injector::create_with_execution_context(&app, ExecutionContext::from_value(Arc::new(5u8))).unwrap();
    let session = shadow.get_contextual::<Session>().unwrap();

    assert_eq!(session.properties(), &["request"]);
    assert!(session.is_bound("request"));
    assert!(!session.is_bound("label"));
    assert!(session.bound("label").is_none());
    assert!(session.bound_as::<String>("request").is_none());
}

#[test]
fn test_getter_runs_on_every_access() {
    let app = app();
    app.instantiate_all().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let context = ExecutionContext::new(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(n) as AnyArc
    });

    let shadow = Injector::create_with_execution_context(&app, context).unwrap();
    let session = shadow.get_contextual::<Session>().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(*session.bound_as::<usize>("request").unwrap(), 0);
    assert_eq!(*session.bound_as::<usize>("request").unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_context_bound_provider_must_be_instantiated() {
    let app = app();

    let err = Injector::create_with_execution_context(&app, ExecutionContext::from_value(Arc::new(()))).unwrap_err();
    match err {
        DiError::NotInstantiated { token, injector } => {
            assert!(token.ends_with("Session"));
            assert_eq!(injector, "app");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_shadow_keeps_source_fallback() {
    let extra = Token::opaque("extra");
    let fallback = Injector::create("fallback", &[Provider::provide(&extra).use_value(9u8)], None, None).unwrap();
    let source = Injector::create("source", &[], None, Some(fallback)).unwrap();

    let shadow = Injector::create_with_execution_context(&source, ExecutionContext::from_value(Arc::new(()))).unwrap();
    assert!(shadow.fallback().is_some());
    assert_eq!(*shadow.get_as::<u8>(&extra).unwrap(), 9);
}

#[test]
fn test_current_context_is_typed() {
    let context = ExecutionContext::from_value(Arc::new("ctx".to_string()));
    assert_eq!(*context.current::<String>().unwrap(), "ctx");
    assert!(context.current::<u8>().is_none());
}
