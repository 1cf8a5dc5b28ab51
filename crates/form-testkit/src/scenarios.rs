//! Ready-made forms shared by integration tests and benches.

use form_core::{Boundary, DataType, Form, ParameterId, PointId, PuzzleId};
use form_puzzle::StrategyLibrary;

use crate::forms::{padding, FormBuilder};

/// Single-peak form and the ids tests refer to.
pub struct SinglePeak {
    pub form: Form,
    pub p1: PointId,
    pub a: ParameterId,
    pub amplitude_pc: PuzzleId,
    pub threshold_hc: Option<PuzzleId>,
}

fn single_peak_builder(library: &StrategyLibrary) -> (FormBuilder, PointId, ParameterId, PuzzleId) {
    let mut builder = FormBuilder::new("single-peak");
    let p1 = builder.point("p1");
    let a = builder.parameter("a", DataType::Float);
    let selector = builder.puzzle(library, "GlobalMax").build();
    let track = builder.track(Vec::new(), vec![selector]);
    let (left, right) = padding(0.1);
    builder.step(p1, left, right, vec![track]);
    let pc = builder
        .puzzle(library, "Amplitude")
        .point("point", p1)
        .output("amplitude", a)
        .build();
    let amplitude_pc = builder.add(pc);
    (builder, p1, a, amplitude_pc)
}

/// One point `p1` placed by `GlobalMax` within `[-0.1, +0.1]` of the centre
/// and one parameter `a` computed by `Amplitude`.
pub fn single_peak(library: &StrategyLibrary) -> SinglePeak {
    let (builder, p1, a, amplitude_pc) = single_peak_builder(library);
    SinglePeak {
        form: builder.build(),
        p1,
        a,
        amplitude_pc,
        threshold_hc: None,
    }
}

/// Single-peak form with a `GreaterThan` hard condition `a > threshold`.
pub fn single_peak_with_threshold(library: &StrategyLibrary, threshold: f64) -> SinglePeak {
    let (mut builder, p1, a, amplitude_pc) = single_peak_builder(library);
    let hc = builder
        .puzzle(library, "GreaterThan")
        .arg("threshold", &threshold.to_string())
        .input("value", a)
        .build();
    let threshold_hc = builder.add(hc);
    SinglePeak {
        form: builder.build(),
        p1,
        a,
        amplitude_pc,
        threshold_hc: Some(threshold_hc),
    }
}

/// Multi-step form for scheduler tests and benches.
///
/// Step `k` places `p{k}` right of `p{k-1}` (step 0 pads around the centre);
/// each step gets an `Amplitude` PC on its point followed by `relays` chained
/// `Relay` PCs, and a `GreaterThan` HC on the last parameter of the chain.
pub fn staircase(library: &StrategyLibrary, steps: usize, relays: usize) -> Form {
    let mut builder = FormBuilder::new("staircase");
    let mut previous: Option<PointId> = None;
    for k in 0..steps {
        let point = builder.point(&format!("p{k}"));
        let selector = builder.puzzle(library, "LocalMaxima").build();
        let track = builder.track(Vec::new(), vec![selector]);
        let (left, right) = match previous {
            Some(prev) => (Boundary::Point(prev), Boundary::Offset(0.2)),
            None => padding(0.1),
        };
        builder.step(point, left, right, vec![track]);

        let mut param = builder.parameter(&format!("amp{k}"), DataType::Float);
        let pc = builder
            .puzzle(library, "Amplitude")
            .point("point", point)
            .output("amplitude", param)
            .build();
        builder.add(pc);
        for r in 0..relays {
            let next = builder.parameter(&format!("relay{k}_{r}"), DataType::Float);
            let pc = builder
                .puzzle(library, "Relay")
                .input("input", param)
                .output("output", next)
                .build();
            builder.add(pc);
            param = next;
        }
        let hc = builder
            .puzzle(library, "GreaterThan")
            .input("value", param)
            .build();
        builder.add(hc);
        previous = Some(point);
    }
    builder.build()
}
