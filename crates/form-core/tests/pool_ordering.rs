use form_core::{pool_order, Exemplar, ExemplarId, ExemplarsPool, Signal};
use proptest::prelude::*;

fn candidate(id: u64, score: Option<u8>) -> Exemplar {
    let signal = Signal::new(vec![0.0; 8], 100.0).unwrap();
    let mut ex = Exemplar::new(ExemplarId::from_raw(id), signal);
    ex.set_evaluation(score.map(|s| f64::from(s) / 10.0)).unwrap();
    ex
}

fn build(scores: &[Option<u8>], order: &[usize], capacity: Option<usize>) -> Vec<u64> {
    let mut pool = ExemplarsPool::new(capacity).unwrap();
    for &idx in order {
        pool.insert(candidate(idx as u64, scores[idx]));
    }
    pool.iter().map(|ex| ex.id().as_raw()).collect()
}

fn assert_sorted(pool: &ExemplarsPool) {
    let held: Vec<&Exemplar> = pool.iter().collect();
    for pair in held.windows(2) {
        assert_ne!(pool_order(pair[0], pair[1]), std::cmp::Ordering::Greater);
    }
}

proptest! {
    #[test]
    fn pool_stays_sorted(scores in prop::collection::vec(prop::option::of(0u8..=10), 1..40), cap in 1usize..12) {
        let mut pool = ExemplarsPool::new(Some(cap)).unwrap();
        for (idx, score) in scores.iter().enumerate() {
            pool.insert(candidate(idx as u64, *score));
            assert_sorted(&pool);
            prop_assert!(pool.len() <= cap);
        }
    }

    #[test]
    fn insertion_order_does_not_change_top_n(
        order in Just((0..24usize).collect::<Vec<_>>()).prop_shuffle(),
        scores in prop::collection::vec(prop::option::of(0u8..=4), 24),
        cap in prop::option::of(1usize..10),
    ) {
        let forward: Vec<usize> = (0..scores.len()).collect();
        prop_assert_eq!(build(&scores, &forward, cap), build(&scores, &order, cap));
    }
}

#[test]
fn drain_empties_in_pool_order() {
    let mut pool = ExemplarsPool::unbounded();
    pool.insert(candidate(1, Some(2)));
    pool.insert(candidate(2, Some(9)));
    let drained: Vec<u64> = pool.drain().iter().map(|ex| ex.id().as_raw()).collect();
    assert_eq!(drained, vec![2, 1]);
    assert!(pool.is_empty());
}
