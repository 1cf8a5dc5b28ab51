use form_core::{codes, DataType, Exemplar, ExemplarId, ParamValue};
use form_puzzle::{dedup_coordinates, PuzzleOutcome, RunnableHc, RunnablePc, RunnablePs, RunnableSm};
use form_testkit::{reference_library, single_peak_signal, FormBuilder};
use proptest::prelude::*;

const RATE: f64 = 100.0;

fn exemplar() -> Exemplar {
    Exemplar::new(ExemplarId::from_raw(1), single_peak_signal(RATE))
}

#[test]
fn modifier_must_keep_sample_count() {
    let library = reference_library();
    let mut builder = FormBuilder::new("sm");
    let sm = builder.puzzle(&library, "Truncate").build();
    let form = builder.build();
    let runnable = RunnableSm::new(&sm, &form, library.get("Truncate").unwrap()).unwrap();
    let signal = single_peak_signal(RATE);
    let err = runnable.run(&signal, 0.0, 1.0).unwrap_err();
    assert_eq!(err.code(), codes::SM_CHANGED_LEN);
    assert_eq!(err.info().context["delta"], "-1");
    assert!(err.is_candidate_local());
}

#[test]
fn modifier_output_keeps_time_axis() {
    let library = reference_library();
    let mut builder = FormBuilder::new("sm");
    let sm = builder.puzzle(&library, "Scale").arg("factor", "2").build();
    let form = builder.build();
    let runnable = RunnableSm::new(&sm, &form, library.get("Scale").unwrap()).unwrap();
    let signal = single_peak_signal(RATE);
    let scaled = runnable.run(&signal, 0.0, 1.0).unwrap().into_result().unwrap();
    assert_eq!(scaled.len(), signal.len());
    assert_eq!(scaled.start_time(), signal.start_time());
    let peak = signal.index_of(0.5).unwrap();
    assert!((scaled.samples()[peak] - 2.0 * signal.samples()[peak]).abs() < 1e-12);
}

#[test]
fn selector_points_must_lie_in_the_window() {
    let library = reference_library();
    let mut builder = FormBuilder::new("ps");
    let ps = builder.puzzle(&library, "FixedPoints").arg("points", "[0.9]").build();
    let form = builder.build();
    let runnable = RunnablePs::new(&ps, &form, library.get("FixedPoints").unwrap()).unwrap();
    let err = runnable.run(&single_peak_signal(RATE), 0.4, 0.6, 1e-6).unwrap_err();
    assert_eq!(err.code(), codes::POINT_OUT_OF_INTERVAL);
    assert_eq!(err.info().context["point"], "0.9");
}

#[test]
fn selector_output_is_sorted_and_deduplicated() {
    let library = reference_library();
    let mut builder = FormBuilder::new("ps");
    let ps = builder
        .puzzle(&library, "FixedPoints")
        .arg("points", "[0.5, 0.3, 0.5000001, 0.4]")
        .build();
    let form = builder.build();
    let runnable = RunnablePs::new(&ps, &form, library.get("FixedPoints").unwrap()).unwrap();
    let coords = runnable
        .run(&single_peak_signal(RATE), 0.0, 1.0, 1e-3)
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(coords, vec![0.3, 0.4, 0.5]);
}

#[test]
fn global_max_finds_the_peak() {
    let library = reference_library();
    let mut builder = FormBuilder::new("ps");
    let ps = builder.puzzle(&library, "GlobalMax").build();
    let form = builder.build();
    let runnable = RunnablePs::new(&ps, &form, library.get("GlobalMax").unwrap()).unwrap();
    let coords = runnable
        .run(&single_peak_signal(RATE), 0.4, 0.6, 1e-6)
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(coords.len(), 1);
    assert!((coords[0] - 0.5).abs() < 1.0 / RATE);
}

#[test]
fn selector_failure_is_an_execution_error() {
    let library = reference_library();
    let mut builder = FormBuilder::new("ps");
    let ps = builder.puzzle(&library, "Broken").build();
    let form = builder.build();
    let runnable = RunnablePs::new(&ps, &form, library.get("Broken").unwrap()).unwrap();
    let err = runnable.run(&single_peak_signal(RATE), 0.0, 1.0, 1e-6).unwrap_err();
    assert_eq!(err.code(), codes::EXECUTION);
    assert!(err.info().context["cause"].contains("broken"));
    assert!(err.is_candidate_local());
}

#[test]
fn narrow_window_opts_out() {
    let library = reference_library();
    let mut builder = FormBuilder::new("ps");
    let ps = builder.puzzle(&library, "NeedsWideWindow").arg("min_width", "0.5").build();
    let form = builder.build();
    let runnable = RunnablePs::new(&ps, &form, library.get("NeedsWideWindow").unwrap()).unwrap();
    let outcome = runnable.run(&single_peak_signal(RATE), 0.4, 0.6, 1e-6).unwrap();
    assert!(outcome.is_out_of_signal());
    let err = outcome.into_result().unwrap_err();
    assert_eq!(err.code(), codes::OUT_OF_SIGNAL);
    assert_eq!(err.info().context["class_name"], "NeedsWideWindow");

    let wide = runnable.run(&single_peak_signal(RATE), 0.0, 1.0, 1e-6).unwrap();
    assert!(matches!(wide, PuzzleOutcome::Done(ref c) if c == &vec![0.5]));
}

#[test]
fn calculator_reads_points_and_writes_form_names() {
    let library = reference_library();
    let mut builder = FormBuilder::new("pc");
    let p1 = builder.point("p1");
    let a = builder.parameter("a", DataType::Float);
    let pc = builder
        .puzzle(&library, "Amplitude")
        .point("point", p1)
        .output("amplitude", a)
        .build();
    let form = builder.build();
    let runnable = RunnablePc::new(&pc, &form, library.get("Amplitude").unwrap()).unwrap();

    let mut exemplar = exemplar();
    let err = runnable.run(&exemplar).unwrap_err();
    assert_eq!(err.code(), codes::MISSING_INPUT_POINTS);
    assert_eq!(err.info().context["missing"], "p1");

    assert!(exemplar.add_point("p1", 0.5, None).unwrap());
    let produced = runnable.run(&exemplar).unwrap().into_result().unwrap();
    let amplitude = produced["a"].as_f64().unwrap();
    assert!((amplitude - 1.0).abs() < 1e-3);
}

#[test]
fn calculator_reports_missing_parameters_by_form_name() {
    let library = reference_library();
    let mut builder = FormBuilder::new("pc");
    let left = builder.parameter("left", DataType::Float);
    let right = builder.parameter("right", DataType::Float);
    let total = builder.parameter("total", DataType::Float);
    let pc = builder
        .puzzle(&library, "Sum")
        .input("x", left)
        .input("y", right)
        .output("sum", total)
        .build();
    let form = builder.build();
    let runnable = RunnablePc::new(&pc, &form, library.get("Sum").unwrap()).unwrap();

    let mut exemplar = exemplar();
    exemplar.add_parameter("left", ParamValue::Float(1.5)).unwrap();
    let err = runnable.run(&exemplar).unwrap_err();
    assert_eq!(err.code(), codes::MISSING_INPUT_PARAMS);
    assert_eq!(err.info().context["missing"], "right");

    exemplar.add_parameter("right", ParamValue::Int(2)).unwrap();
    let produced = runnable.run(&exemplar).unwrap().into_result().unwrap();
    assert_eq!(produced["total"], ParamValue::Float(3.5));
}

#[test]
fn undeclared_output_is_an_execution_error() {
    let library = reference_library();
    let mut builder = FormBuilder::new("pc");
    let declared = builder.parameter("declared", DataType::Float);
    let pc = builder.puzzle(&library, "Rogue").output("declared", declared).build();
    let form = builder.build();
    let runnable = RunnablePc::new(&pc, &form, library.get("Rogue").unwrap()).unwrap();
    let err = runnable.run(&exemplar()).unwrap_err();
    assert_eq!(err.code(), codes::EXECUTION);
    assert_eq!(err.info().context["output"], "surprise");
}

#[test]
fn calculator_output_must_match_parameter_type() {
    let library = reference_library();
    let mut builder = FormBuilder::new("pc");
    let input = builder.parameter("input", DataType::Float);
    let output = builder.parameter("label", DataType::Str);
    let pc = builder
        .puzzle(&library, "Relay")
        .input("input", input)
        .output("output", output)
        .build();
    let form = builder.build();
    let runnable = RunnablePc::new(&pc, &form, library.get("Relay").unwrap()).unwrap();
    let mut exemplar = exemplar();
    exemplar.add_parameter("input", ParamValue::Float(0.25)).unwrap();
    let err = runnable.run(&exemplar).unwrap_err();
    assert_eq!(err.code(), codes::EXECUTION);
    assert_eq!(err.info().context["expected"], "str");
}

#[test]
fn hard_condition_verdicts() {
    let library = reference_library();
    let mut builder = FormBuilder::new("hc");
    let a = builder.parameter("a", DataType::Float);
    let hc = builder
        .puzzle(&library, "GreaterThan")
        .arg("threshold", "0.5")
        .input("value", a)
        .build();
    let form = builder.build();
    let runnable = RunnableHc::new(&hc, &form, library.get("GreaterThan").unwrap()).unwrap();

    let mut low = exemplar();
    low.add_parameter("a", ParamValue::Float(0.2)).unwrap();
    let mut high = exemplar();
    high.add_parameter("a", ParamValue::Float(0.8)).unwrap();
    assert!(!runnable.run(&low).unwrap().into_result().unwrap());
    assert!(runnable.run(&high).unwrap().into_result().unwrap());
    assert_eq!(runnable.run(&exemplar()).unwrap_err().code(), codes::MISSING_INPUT_PARAMS);
}

#[test]
fn wrong_kind_class_is_a_creation_error() {
    let library = reference_library();
    let mut builder = FormBuilder::new("kind");
    let ps = builder.puzzle(&library, "GlobalMax").build();
    let form = builder.build();
    let err = RunnableSm::new(&ps, &form, library.get("GlobalMax").unwrap()).unwrap_err();
    assert_eq!(err.code(), codes::CLASS_CREATION);
    assert!(!err.is_candidate_local());
}

proptest! {
    #[test]
    fn dedup_output_is_sorted_and_spaced(
        coords in prop::collection::vec(0.0f64..10.0, 0..40),
        epsilon in 1e-6f64..0.5,
    ) {
        let kept = dedup_coordinates(coords.clone(), epsilon);
        for pair in kept.windows(2) {
            prop_assert!(pair[1] - pair[0] >= epsilon);
        }
        for t in &coords {
            prop_assert!(kept.iter().any(|k| k <= t && t - k < epsilon));
        }
        prop_assert_eq!(dedup_coordinates(kept.clone(), epsilon), kept);
    }
}
