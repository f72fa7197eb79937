use parking_lot::Mutex;
use reflective_di::{
    DestroyTracker, Factory, Injectable, InjectableMetadata, Injector, OnDestroy, Provider,
    ProviderScope, Resolver, Token,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static CONNECTIONS_CLOSED: AtomicUsize = AtomicUsize::new(0);

struct Connection;

impl OnDestroy for Connection {
    fn on_destroy(&self) {
        CONNECTIONS_CLOSED.fetch_add(1, Ordering::SeqCst);
    }
}

impl Injectable for Connection {
    fn metadata() -> InjectableMetadata<Self> {
        InjectableMetadata::new(|_| Ok(Connection))
            .scope(ProviderScope::Operation)
            .with_destroy_hook()
    }
}

fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Factory {
    let log = log.clone();
    Factory::new(move |_| Ok(name)).on_destroy(move |value: &&'static str| log.lock().push(*value))
}

#[test]
fn test_class_hook_runs_once() {
    let injector = Injector::create("operation", &[Provider::class::<Connection>()], None, None).unwrap();
    let tracker = DestroyTracker::new();
    assert_eq!(tracker.track(&injector), 1);

    injector.get::<Connection>().unwrap();
    injector.get::<Connection>().unwrap();

    let before = CONNECTIONS_CLOSED.load(Ordering::SeqCst);
    assert_eq!(tracker.destroy(), 1);
    assert_eq!(tracker.destroy(), 0);
    assert!(tracker.is_destroyed());
    assert_eq!(CONNECTIONS_CLOSED.load(Ordering::SeqCst), before + 1);
}

#[test]
fn test_uninstantiated_providers_are_skipped() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let token = Token::opaque("never-built");
    let injector = Injector::create(
        "operation",
        &[Provider::provide(&token)
            .scope(ProviderScope::Operation)
            .use_factory(recording(&log, "never-built"))],
        None,
        None,
    )
    .unwrap();

    let tracker = DestroyTracker::new();
    tracker.track(&injector);
    assert_eq!(tracker.len(), 1);

    assert_eq!(tracker.destroy(), 0);
    assert!(log.lock().is_empty());
    assert!(!injector.is_instantiated(&token));
}

#[test]
fn test_tracking_twice_registers_hooks_once() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let token = Token::opaque("tracked-twice");
    let injector = Injector::create(
        "operation",
        &[Provider::provide(&token)
            .scope(ProviderScope::Operation)
            .use_factory(recording(&log, "tracked-twice"))],
        None,
        None,
    )
    .unwrap();

    let tracker = DestroyTracker::new();
    assert_eq!(tracker.track(&injector), 1);
    assert_eq!(tracker.track(&injector), 0);
    assert_eq!(tracker.len(), 1);

    injector.get_any(&token).unwrap();
    assert_eq!(tracker.destroy(), 1);
    assert_eq!(*log.lock(), vec!["tracked-twice"]);
}

#[test]
fn test_destroyed_tracker_refuses_new_injectors() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let token = Token::opaque("late");
    let injector = Injector::create(
        "operation",
        &[Provider::provide(&token)
            .scope(ProviderScope::Operation)
            .use_factory(recording(&log, "late"))],
        None,
        None,
    )
    .unwrap();

    let tracker = DestroyTracker::new();
    assert_eq!(tracker.destroy(), 0);
    assert_eq!(tracker.track(&injector), 0);
    assert!(tracker.is_empty());

    injector.get_any(&token).unwrap();
    assert_eq!(tracker.destroy(), 0);
    assert!(log.lock().is_empty());
}

#[test]
fn test_hooks_run_newest_first() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let first = Token::opaque("first");
    let second = Token::opaque("second");
    let third = Token::opaque("third");

    let outer = Injector::create(
        "outer",
        &[
            Provider::provide(&first)
                .scope(ProviderScope::Operation)
                .use_factory(recording(&log, "first")),
            Provider::provide(&second)
                .scope(ProviderScope::Operation)
                .use_factory(recording(&log, "second")),
        ],
        None,
        None,
    )
    .unwrap();
    let inner = Injector::create(
        "inner",
        &[Provider::provide(&third)
            .scope(ProviderScope::Operation)
            .use_factory(recording(&log, "third"))],
        Some(outer.clone()),
        None,
    )
    .unwrap();

    let tracker = DestroyTracker::new();
    tracker.track(&outer);
    tracker.track(&inner);

    inner.get_any(&first).unwrap();
    inner.get_any(&second).unwrap();
    inner.get_any(&third).unwrap();

    assert_eq!(tracker.destroy(), 3);
    assert_eq!(*log.lock(), vec!["third", "second", "first"]);
}

#[test]
fn test_singleton_hooks_are_not_tracked() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let token = Token::opaque("singleton");
    let injector = Injector::create(
        "app",
        &[Provider::provide(&token).use_factory(recording(&log, "singleton"))],
        None,
        None,
    )
    .unwrap();
    injector.get_any(&token).unwrap();

    let tracker = DestroyTracker::new();
    assert_eq!(tracker.track(&injector), 0);
    assert!(tracker.is_empty());
    assert_eq!(tracker.destroy(), 0);
    assert!(log.lock().is_empty());
}

#[test]
fn test_descriptor_reports_hook() {
    let injector = Injector::create("operation", &[Provider::class::<Connection>()], None, None).unwrap();
    let descriptors = injector.descriptors();
    assert!(descriptors[0].has_destroy_hook);
    assert_eq!(descriptors[0].scope, ProviderScope::Operation);
}
