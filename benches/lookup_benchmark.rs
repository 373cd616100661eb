//! Benchmarks for the O(log N x max_level) lookup claim (spec.md §5).
//!
//! Run with: cargo bench --features bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tldrs::compiler::emit::emit;
use tldrs::compiler::rule::Rule;
use tldrs::{lookup, LoadedRules, Status};

/// Builds a compiled rule file with `width` distinct top-level TLDs, each
/// carrying one second-level child, to exercise both the top-level binary
/// search and one level of descent.
fn generate_rules(width: usize) -> Vec<u8> {
    let mut rules = Vec::with_capacity(width * 2);
    for i in 0..width {
        let tld = format!("tld{i}");
        let mut top = Rule::new();
        top.add_segment(&tld, "bench", 1).unwrap();
        top.close();
        top.set_status(Status::Valid, "bench", 1).unwrap();
        top.add_tag("country", "none");
        rules.push(top);

        let mut child = Rule::new();
        child.add_segment(&tld, "bench", 1).unwrap();
        child.add_segment("co", "bench", 1).unwrap();
        child.close();
        child.set_status(Status::Valid, "bench", 1).unwrap();
        child.add_tag("country", "none");
        rules.push(child);
    }
    emit(rules, 0).unwrap()
}

fn generate_queries(width: usize, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("host.co.tld{}", i % width))
        .collect()
}

fn bench_lookup_throughput(c: &mut Criterion) {
    let data = generate_rules(10_000);
    let loaded = LoadedRules::from_bytes(&data).unwrap();
    let queries = generate_queries(10_000, 1_000);

    let mut group = c.benchmark_group("lookup_throughput");
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("descend_one_level", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(lookup(&loaded, q).unwrap());
            }
        })
    });
    group.finish();
}

fn bench_lookup_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_scalability");
    for width in [100usize, 1_000, 10_000].iter() {
        let data = generate_rules(*width);
        let loaded = LoadedRules::from_bytes(&data).unwrap();
        let queries = generate_queries(*width, 200);

        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_with_input(BenchmarkId::new("tlds", width), width, |b, _| {
            b.iter(|| {
                for q in &queries {
                    black_box(lookup(&loaded, q).unwrap());
                }
            })
        });
    }
    group.finish();
}

fn bench_lookup_not_found(c: &mut Criterion) {
    let data = generate_rules(10_000);
    let loaded = LoadedRules::from_bytes(&data).unwrap();

    c.bench_function("lookup_not_found", |b| {
        b.iter(|| black_box(lookup(&loaded, "host.bogus-tld-xyz").unwrap_err()))
    });
}

fn bench_enumerate_full_pass(c: &mut Criterion) {
    use tldrs::Enumerator;

    let data = generate_rules(1_000);
    let loaded = LoadedRules::from_bytes(&data).unwrap();

    c.bench_function("enumerate_full_pass", |b| {
        b.iter(|| {
            let mut it = Enumerator::new(&loaded);
            let mut count = 0usize;
            while it.next().is_ok() {
                count += 1;
            }
            black_box(count)
        })
    });
}

criterion_group!(
    benches,
    bench_lookup_throughput,
    bench_lookup_scalability,
    bench_lookup_not_found,
    bench_enumerate_full_pass,
);
criterion_main!(benches);
