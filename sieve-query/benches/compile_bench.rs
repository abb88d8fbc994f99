//! Benchmarks for filter compilation and SQL rendering

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use sieve_query::{
    PageRequest, SpecificationCompiler,
    spec::{Declarations, FilterDeclaration, FilterSpec, Operation},
    sql::SqlCriteria,
    types::OrderByField,
};

#[derive(Default)]
struct PersonFilter {
    name: Option<String>,
    status: Option<String>,
    city: Option<String>,
    statuses: Option<Vec<String>>,
    deleted: Option<bool>,
}

sieve_query::filter_spec!(PersonFilter {
    name => StartsWith,
    status => Equal @ "account.status",
    city => Like @ "account.owner.address.city",
    statuses => In,
    deleted => IsNull,
});

fn full_filter() -> PersonFilter {
    PersonFilter {
        name: Some("Jo".into()),
        status: Some("ACTIVE".into()),
        city: Some("Lisbon".into()),
        statuses: Some(vec!["A".into(), "B".into(), "C".into()]),
        deleted: Some(true),
    }
}

/// A filter with `n` root equality fields, built without the macro.
struct WideFilter {
    values: Vec<Option<i64>>,
}

impl FilterSpec for WideFilter {
    fn declarations() -> Declarations<Self> {
        (0..64).fold(Declarations::new(), |decls, i| {
            decls.field(
                FilterDeclaration::new(format!("field_{}", i), Operation::Equal),
                move |f: &Self| Ok(f.values.get(i).copied().flatten().map(Into::into)),
            )
        })
    }
}

// ============================================================================
// Compilation Benchmarks
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let compiler = SpecificationCompiler::default();
    let page = PageRequest::of(0, 20);

    group.bench_function("empty_filter", |b| {
        let filter = PersonFilter::default();
        b.iter(|| {
            let mut criteria = SqlCriteria::new("people");
            black_box(compiler.constraint(&filter, &mut criteria).ok())
        })
    });

    group.bench_function("full_filter", |b| {
        let filter = full_filter();
        b.iter(|| {
            let mut criteria = SqlCriteria::new("people");
            black_box(compiler.compile(&filter, &page, &mut criteria).ok())
        })
    });

    for set in [1usize, 8, 32, 64] {
        group.throughput(Throughput::Elements(set as u64));
        group.bench_with_input(BenchmarkId::new("wide_filter", set), &set, |b, &set| {
            let filter = WideFilter {
                values: (0..64).map(|i| (i < set).then_some(i as i64)).collect(),
            };
            b.iter(|| {
                let mut criteria = SqlCriteria::new("people");
                black_box(compiler.constraint(&filter, &mut criteria).ok())
            })
        });
    }

    group.finish();
}

// ============================================================================
// Rendering Benchmarks
// ============================================================================

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let compiler = SpecificationCompiler::default();
    let filter = full_filter();
    let page = PageRequest::of(3, 50).with_sort([OrderByField::desc("status"), OrderByField::asc("name")]);

    group.bench_function("compile_and_finish", |b| {
        b.iter(|| {
            let mut criteria = SqlCriteria::new("people");
            let compiled = compiler.compile(&filter, &page, &mut criteria).ok()?;
            black_box(criteria.finish(&compiled.constraint, &compiled.page).ok())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_render);

criterion_main!(benches);
