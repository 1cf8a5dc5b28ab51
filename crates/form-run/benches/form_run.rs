use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use form_puzzle::StrategyRegistry;
use form_run::{EngineConfig, FormRunner};
use form_testkit::{reference_library, sine, staircase};

fn bench_staircase(c: &mut Criterion) {
    let library = reference_library();
    let registry = StrategyRegistry::from_library(&library);
    let signal = sine(6.25, 0.0, 1.0, 500.0, 4.0);
    let mut group = c.benchmark_group("form_run");
    for steps in [2usize, 8, 16] {
        let config = EngineConfig {
            max_pool_size: Some(32),
            ..EngineConfig::default()
        };
        let runner = FormRunner::new(staircase(&library, steps, 2), &registry, config, None).expect("runner");
        group.bench_with_input(BenchmarkId::new("staircase", steps), &runner, |b, runner| {
            b.iter(|| runner.run(black_box(signal.clone()), 0.52).expect("run"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_staircase);
criterion_main!(benches);
