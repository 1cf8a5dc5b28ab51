use form_core::{pool_order, DataType};
use form_eval::ReferenceTable;
use form_puzzle::StrategyRegistry;
use form_run::{EngineConfig, FormRunner};
use form_testkit::{padding, reference_library, single_peak_signal, FormBuilder};
use proptest::prelude::*;

fn literal(points: &[f64]) -> String {
    points.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(",")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn children_stay_inside_the_interval_and_apart(
        first in prop::collection::vec(0.4f64..=0.6, 1..6),
        second in prop::collection::vec(0.4f64..=0.6, 0..6),
        epsilon in 0.005f64..0.05,
        capacity in prop::option::of(1usize..5),
    ) {
        let library = reference_library();
        let mut builder = FormBuilder::new("invariants");
        let p1 = builder.point("p1");
        let a = builder.parameter("a", DataType::Float);
        let mut tracks = Vec::new();
        for points in [&first, &second] {
            if points.is_empty() {
                continue;
            }
            let selector = builder.puzzle(&library, "FixedPoints").arg("points", &literal(points)).build();
            tracks.push(builder.track(Vec::new(), vec![selector]));
        }
        let (left, right) = padding(0.1);
        builder.step(p1, left, right, tracks);
        let pc = builder.puzzle(&library, "Amplitude").point("point", p1).output("amplitude", a).build();
        builder.add(pc);

        let config = EngineConfig { max_pool_size: capacity, epsilon_for_dubles: epsilon, ..EngineConfig::default() };
        let table = ReferenceTable::from_column("a", vec![0.95, 1.0]).unwrap();
        let registry = StrategyRegistry::from_library(&library);
        let runner = FormRunner::with_reference(builder.build(), &registry, config, &table, None).unwrap();
        let run = runner.run(single_peak_signal(100.0), 0.5).unwrap();

        let mut coords: Vec<f64> = run.pool.iter().map(|ex| ex.point("p1").unwrap()).collect();
        for t in &coords {
            prop_assert!((0.4 - 1e-9..=0.6 + 1e-9).contains(t));
        }
        coords.sort_by(f64::total_cmp);
        for pair in coords.windows(2) {
            prop_assert!(pair[1] - pair[0] >= epsilon);
        }
        if let Some(cap) = capacity {
            prop_assert!(run.pool.len() <= cap);
        }
        let held: Vec<_> = run.pool.iter().collect();
        for pair in held.windows(2) {
            prop_assert_ne!(pool_order(pair[0], pair[1]), std::cmp::Ordering::Greater);
        }
    }
}
