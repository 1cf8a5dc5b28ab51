use criterion::{criterion_group, criterion_main, Criterion};

use form_core::{Exemplar, ExemplarId, ExemplarsPool, Signal};

fn candidates() -> Vec<Exemplar> {
    let signal = Signal::new(vec![0.0; 500], 500.0).unwrap();
    (0..512u64)
        .map(|id| {
            let mut ex = Exemplar::new(ExemplarId::from_raw(id), signal.clone());
            let score = ((id * 7919) % 1000) as f64 / 1000.0;
            ex.set_evaluation(Some(score)).unwrap();
            ex
        })
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let batch = candidates();
    c.bench_function("pool_insert_bounded_64", |b| {
        b.iter(|| {
            let mut pool = ExemplarsPool::new(Some(64)).unwrap();
            for ex in batch.iter().cloned() {
                pool.insert(ex);
            }
            pool.len()
        })
    });
}

criterion_group!(benches, bench_insert);
criterion_main!(benches);
