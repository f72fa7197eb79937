use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reflective_di::*;
use std::sync::Arc;

// ===== Micro Benchmarks =====

fn bench_cached_hit(c: &mut Criterion) {
    let token = Token::opaque("number");
    let injector = Injector::create("bench", &[Provider::provide(&token).use_value(42u64)], None, None).unwrap();

    // Prime the cache
    let _ = injector.get_as::<u64>(&token).unwrap();

    c.bench_function("cached_hit_u64", |b| {
        b.iter(|| {
            let v = injector.get_as::<u64>(&token).unwrap();
            black_box(v);
        })
    });
}

fn bench_cold_instantiate(c: &mut Criterion) {
    struct ExpensiveToCreate {
        data: Vec<u64>,
    }

    impl Injectable for ExpensiveToCreate {
        fn metadata() -> InjectableMetadata<Self> {
            InjectableMetadata::new(|_| {
                Ok(ExpensiveToCreate {
                    data: (0..1000).collect(),
                })
            })
        }
    }

    c.bench_function("cold_instantiate_expensive", |b| {
        b.iter_batched(
            || Injector::create("bench", &[Provider::class::<ExpensiveToCreate>()], None, None).unwrap(),
            |injector| {
                let v = injector.get::<ExpensiveToCreate>().unwrap();
                black_box(v.data.len());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_parent_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("parent_depth");
    let token = Token::opaque("root-value");

    for depth in [1usize, 4, 16] {
        let mut injector = Injector::create("root", &[Provider::provide(&token).use_value(1u32)], None, None).unwrap();
        for level in 0..depth {
            injector = Injector::create(format!("level-{level}"), &[], Some(injector), None).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("lookup", depth), &depth, |b, _| {
            b.iter(|| {
                let v = injector.get_as::<u32>(&token).unwrap();
                black_box(v);
            })
        });
    }

    group.finish();
}

fn bench_dependency_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependency_chain");

    for length in [8usize, 32, 128] {
        let tokens: Vec<Token> = (0..length).map(|i| Token::opaque(format!("link-{i}"))).collect();
        let mut providers = vec![Provider::provide(&tokens[0]).use_value(0usize)];
        for pair in tokens.windows(2) {
            providers.push(
                Provider::provide(&pair[1])
                    .use_factory(Factory::new(|args| Ok(*args.get::<usize>(0)? + 1)).param_token(&pair[0])),
            );
        }

        group.bench_with_input(BenchmarkId::new("instantiate_all", length), &length, |b, _| {
            b.iter_batched(
                || Injector::create("bench", &providers, None, None).unwrap(),
                |injector| {
                    injector.instantiate_all().unwrap();
                    black_box(injector);
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

// ===== Operation Lifecycle =====

fn bench_execution_context_shadow(c: &mut Criterion) {
    struct Users;

    impl Injectable for Users {
        fn metadata() -> InjectableMetadata<Self> {
            InjectableMetadata::new(|_| Ok(Users)).execution_context("caller")
        }
    }

    let app = Injector::create("app", &[Provider::class::<Users>()], None, None).unwrap();
    app.instantiate_all().unwrap();

    c.bench_function("execution_context_shadow", |b| {
        b.iter(|| {
            let shadow =
                Injector::create_with_execution_context(&app, ExecutionContext::from_value(Arc::new(7u32))).unwrap();
            black_box(shadow.get_contextual::<Users>().unwrap());
        })
    });
}

fn bench_operation_start(c: &mut Criterion) {
    let mut group = c.benchmark_group("operation");
    let session = Token::opaque("session");
    let config = Token::opaque("config");

    let app = Application::create(
        AppConfig::new()
            .provider(Provider::provide(&config).use_value("production"))
            .provider(
                Provider::provide(&session)
                    .scope(ProviderScope::Operation)
                    .use_factory(Factory::new(|args| Ok(args.get::<&str>(0)?.len())).param_token(&config)),
            )
            .module(Module::new("users")),
    )
    .unwrap();

    group.bench_function("start_and_drop", |b| {
        b.iter(|| {
            let operation = app.operation(()).unwrap();
            black_box(&operation);
        })
    });

    group.bench_function("start_resolve_destroy", |b| {
        b.iter(|| {
            let operation = app.operation(()).unwrap();
            let v = operation.injector().get_as::<usize>(&session).unwrap();
            let users = operation.module_injector("users").unwrap();
            black_box((v, users));
            operation.destroy();
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_cached_hit,
    bench_cold_instantiate,
    bench_parent_depth,
    bench_dependency_chain,
    bench_execution_context_shadow,
    bench_operation_start
);
criterion_main!(benches);
