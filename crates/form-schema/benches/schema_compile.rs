use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use form_schema::Schema;
use form_testkit::{reference_library, staircase};

fn bench_compile(c: &mut Criterion) {
    let library = reference_library();
    let mut group = c.benchmark_group("schema_compile");
    for (steps, relays) in [(4usize, 2usize), (12, 6), (24, 12)] {
        let form = staircase(&library, steps, relays);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{steps}x{relays}")),
            &form,
            |b, form| b.iter(|| Schema::compile(black_box(form)).expect("compile")),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
