/// Benchmarks for the parse / trace / complexity pipeline.
///
/// Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stepwise::domain::complexity::ComplexityEstimator;
use stepwise::domain::trace::{synthesize, TraceLimits};
use stepwise::infrastructure::parser::parse_module;

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Programs
// ═══════════════════════════════════════════════════════════════════════════

/// A program with `statements` top-level assignments and one loop over a
/// list of `items` elements.
fn synthetic_program(statements: usize, items: usize) -> String {
    let mut source = String::new();
    for n in 0..statements {
        source.push_str(&format!("v{} = {} * 3 + len(xs)\n", n, n));
    }
    let list: Vec<String> = (0..items).map(|n| n.to_string()).collect();
    source.push_str(&format!("for i in [{}]:\n    total = i + 1\n    print(total)\n", list.join(", ")));
    source
}

// ═══════════════════════════════════════════════════════════════════════════
// Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for statements in [10, 100, 1_000] {
        let source = synthetic_program(statements, 10);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(statements), &source, |b, source| {
            b.iter(|| parse_module(black_box(source)))
        });
    }
    group.finish();
}

fn bench_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize");
    for items in [10, 100, 1_000] {
        let module = parse_module(&synthetic_program(10, items)).expect("synthetic program parses");
        group.bench_with_input(BenchmarkId::from_parameter(items), &module, |b, module| {
            b.iter(|| synthesize(black_box(module), &[], TraceLimits::default()))
        });
    }
    group.finish();
}

fn bench_complexity(c: &mut Criterion) {
    let module = parse_module(&synthetic_program(1_000, 10)).expect("synthetic program parses");
    c.bench_function("complexity_1000_statements", |b| {
        b.iter(|| ComplexityEstimator::estimate(black_box(&module)))
    });
}

criterion_group!(benches, bench_parse, bench_synthesize, bench_complexity);
criterion_main!(benches);
