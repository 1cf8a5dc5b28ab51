use std::collections::BTreeSet;

use form_core::{Boundary, DataType, Form, ParameterId, PointId};
use form_schema::Schema;
use form_testkit::{padding, reference_library, FormBuilder};
use proptest::prelude::*;

/// Parameter `i` is either measured at a point or relayed from an earlier
/// parameter, so every generated form is acyclic and fully schedulable.
#[derive(Debug, Clone)]
enum Source {
    Point(usize),
    Relay(usize),
}

fn sources() -> impl Strategy<Value = (usize, Vec<Source>, Vec<usize>)> {
    (1usize..4, 1usize..8).prop_flat_map(|(steps, params)| {
        let sources = (0..params)
            .map(|i| {
                if i == 0 {
                    (0..steps).prop_map(Source::Point).boxed()
                } else {
                    prop_oneof![(0..steps).prop_map(Source::Point), (0..i).prop_map(Source::Relay)].boxed()
                }
            })
            .collect::<Vec<_>>();
        let checks = prop::collection::vec(0..params, 0..4);
        (Just(steps), sources, checks)
    })
}

fn build(steps: usize, sources: &[Source], checks: &[usize]) -> Form {
    let library = reference_library();
    let mut builder = FormBuilder::new("generated");
    let points: Vec<PointId> = (0..steps).map(|k| builder.point(&format!("p{k}"))).collect();
    for (k, point) in points.iter().enumerate() {
        let ps = builder.puzzle(&library, "GlobalMax").build();
        let track = builder.track(Vec::new(), vec![ps]);
        let (left, right) = if k == 0 {
            padding(0.1)
        } else {
            (Boundary::Point(points[k - 1]), Boundary::Offset(0.2))
        };
        builder.step(*point, left, right, vec![track]);
    }
    let params: Vec<ParameterId> = (0..sources.len())
        .map(|i| builder.parameter(&format!("x{i}"), DataType::Float))
        .collect();
    let mut puzzles = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        let pc = match source {
            Source::Point(k) => builder
                .puzzle(&library, "Amplitude")
                .point("point", points[*k])
                .output("amplitude", params[i])
                .build(),
            Source::Relay(j) => builder
                .puzzle(&library, "Relay")
                .input("input", params[*j])
                .output("output", params[i])
                .build(),
        };
        puzzles.push(pc);
    }
    for idx in checks {
        let hc = builder
            .puzzle(&library, "GreaterThan")
            .input("value", params[*idx])
            .build();
        puzzles.push(hc);
    }
    puzzles.reverse();
    for puzzle in puzzles {
        builder.add(puzzle);
    }
    builder.build()
}

proptest! {
    #[test]
    fn compile_is_sound_and_complete((steps, sources, checks) in sources()) {
        let form = build(steps, &sources, &checks);
        let schema = Schema::compile(&form).unwrap();

        let mut points: BTreeSet<PointId> = BTreeSet::new();
        let mut params: BTreeSet<ParameterId> = BTreeSet::new();
        let mut seen = BTreeSet::new();
        for plan in schema.steps() {
            points.insert(plan.target_point);
            points.extend(plan.boundary_points.iter().copied());
            for id in &plan.pcs {
                let pc = form.puzzle(*id).unwrap();
                prop_assert!(pc.input_point_ids().is_subset(&points));
                prop_assert!(pc.input_param_ids().is_subset(&params));
                params.extend(pc.output_param_ids());
                prop_assert!(seen.insert(*id));
            }
            for id in &plan.hcs {
                let hc = form.puzzle(*id).unwrap();
                prop_assert!(hc.input_param_ids().is_subset(&params));
                prop_assert!(seen.insert(*id));
            }
        }
        prop_assert_eq!(seen.len(), form.puzzles.len());
    }

    #[test]
    fn compile_is_idempotent((steps, sources, checks) in sources()) {
        let form = build(steps, &sources, &checks);
        let first = Schema::compile(&form).unwrap();
        let second = Schema::compile(&form).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
        prop_assert_eq!(Schema::analyse(&form), first.report().clone());
    }
}
