//! Benchmarks for graph traversal: wide collections, deep chains and shared
//! substructure.

use beanguard::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn factory() -> ValidatorFactory {
    ValidatorFactory::builder()
        .with_builtins()
        .register_bean(
            BeanDeclaration::new("Catalog").property(PropertyDeclaration::new("items").cascade()),
        )
        .register_bean(
            BeanDeclaration::new("Item")
                .property(
                    PropertyDeclaration::new("name")
                        .constraint(builtin::not_blank().build())
                        .constraint(builtin::size(1, 64).build()),
                )
                .property(PropertyDeclaration::new("price").constraint(builtin::positive().build()))
                .property(PropertyDeclaration::new("next").cascade()),
        )
        .build()
        .expect("benchmark factory")
}

fn wide_catalog(items: usize) -> Value {
    let items: Vec<Value> = (0..items)
        .map(|i| {
            let price = if i % 10 == 0 { -1 } else { i as i64 };
            BeanRef::new("Item")
                .with("name", format!("item-{}", i))
                .with("price", price)
                .into()
        })
        .collect();
    BeanRef::new("Catalog").with("items", Value::List(items)).into()
}

fn deep_chain(depth: usize) -> Value {
    let mut head = BeanRef::new("Item").with("name", "tail").with("price", 1);
    for i in 0..depth {
        head = BeanRef::new("Item")
            .with("name", format!("link-{}", i))
            .with("price", 1)
            .with("next", head);
    }
    head.into()
}

fn bench_wide(c: &mut Criterion) {
    let factory = factory();
    let validator = factory.validator();
    let mut group = c.benchmark_group("wide");

    for size in [10, 100, 1000] {
        let catalog = wide_catalog(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &catalog, |b, catalog| {
            b.iter(|| validator.validate(black_box(catalog), &[]))
        });
    }
    group.finish();
}

fn bench_deep(c: &mut Criterion) {
    let factory = factory();
    let validator = factory.validator();
    let mut group = c.benchmark_group("deep");

    for depth in [10, 100, 500] {
        let chain = deep_chain(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &chain, |b, chain| {
            b.iter(|| validator.validate(black_box(chain), &[]))
        });
    }
    group.finish();
}

fn bench_shared(c: &mut Criterion) {
    let factory = factory();
    let validator = factory.validator();
    let shared = BeanRef::new("Item").with("name", "shared").with("price", 3);
    let items: Vec<Value> = (0..1000).map(|_| shared.clone().into()).collect();
    let catalog: Value = BeanRef::new("Catalog").with("items", Value::List(items)).into();

    c.bench_function("shared_1000", |b| {
        b.iter(|| validator.validate(black_box(&catalog), &[]))
    });
}

fn bench_batch(c: &mut Criterion) {
    let factory = factory();
    let validator = factory.validator();
    let roots: Vec<Value> = (0..64).map(|_| wide_catalog(100)).collect();

    c.bench_function("batch_64x100", |b| {
        b.iter(|| validator.validate_batch(black_box(&roots), &[]))
    });
}

criterion_group!(benches, bench_wide, bench_deep, bench_shared, bench_batch);
criterion_main!(benches);
