use form_core::{codes, Boundary, DataType, FormError, PuzzleId};
use form_schema::{Schema, StepPlan};
use form_testkit::{padding, reference_library, single_peak, single_peak_with_threshold, staircase, FormBuilder};

#[test]
fn single_peak_schedules_amplitude_on_step_zero() {
    let library = reference_library();
    let scenario = single_peak_with_threshold(&library, 10.0);
    let schema = Schema::compile(&scenario.form).unwrap();
    assert_eq!(schema.pcs_by_step(0), &[scenario.amplitude_pc]);
    assert_eq!(schema.hcs_by_step(0), &[scenario.threshold_hc.unwrap()]);
    assert!(schema.required_points_of_step(0).is_empty());
    assert!(schema.pcs_by_step(7).is_empty());
}

#[test]
fn mutually_dependent_pcs_are_reported_as_a_cycle() {
    let library = reference_library();
    let mut builder = FormBuilder::new("cycle");
    let p1 = builder.point("p1");
    let a = builder.parameter("a", DataType::Float);
    let b = builder.parameter("b", DataType::Float);
    let selector = builder.puzzle(&library, "GlobalMax").build();
    let track = builder.track(Vec::new(), vec![selector]);
    let (left, right) = padding(0.1);
    builder.step(p1, left, right, vec![track]);
    let first = builder
        .puzzle(&library, "Relay")
        .input("input", b)
        .output("output", a)
        .build();
    let second = builder
        .puzzle(&library, "Relay")
        .input("input", a)
        .output("output", b)
        .build();
    let first = builder.add(first);
    let second = builder.add(second);
    let form = builder.build();

    let report = Schema::analyse(&form);
    assert_eq!(report.unscheduled_pcs, vec![first, second]);
    assert_eq!(report.cycles, vec![vec![first, second]]);

    let err = Schema::compile(&form).unwrap_err();
    assert!(matches!(err, FormError::Schema(_)));
    assert_eq!(err.code(), codes::SCHEMA_BLOCKED);
    let listed = &err.info().context["unscheduled_pcs"];
    assert!(listed.contains(&first.to_string()));
    assert!(listed.contains(&second.to_string()));
    assert!(err.info().context.contains_key("cycles"));
}

#[test]
fn pcs_ready_together_are_ordered_by_id() {
    let library = reference_library();
    let mut builder = FormBuilder::new("ties");
    let p1 = builder.point("p1");
    let a = builder.parameter("a", DataType::Float);
    let b = builder.parameter("b", DataType::Float);
    let c = builder.parameter("c", DataType::Float);
    let selector = builder.puzzle(&library, "GlobalMax").build();
    let track = builder.track(Vec::new(), vec![selector]);
    let (left, right) = padding(0.1);
    builder.step(p1, left, right, vec![track]);
    let downstream = builder
        .puzzle(&library, "Sum")
        .input("x", a)
        .input("y", b)
        .output("sum", c)
        .build();
    let amp_b = builder
        .puzzle(&library, "Amplitude")
        .point("point", p1)
        .output("amplitude", b)
        .build();
    let amp_a = builder
        .puzzle(&library, "Amplitude")
        .point("point", p1)
        .output("amplitude", a)
        .build();
    let ids = [downstream.id, amp_b.id, amp_a.id];
    // declared out of order on purpose
    builder.add(amp_a);
    builder.add(downstream);
    builder.add(amp_b);
    let form = builder.build();

    let schema = Schema::compile(&form).unwrap();
    assert_eq!(schema.pcs_by_step(0), &[ids[1], ids[2], ids[0]]);
    assert_eq!(schema.pc_order(), vec![ids[1], ids[2], ids[0]]);
}

#[test]
fn pcs_wait_for_the_step_placing_their_points() {
    let library = reference_library();
    let mut builder = FormBuilder::new("width");
    let start = builder.point("start");
    let end = builder.point("end");
    let width = builder.parameter("width", DataType::Float);
    let ps = builder.puzzle(&library, "GlobalMax").build();
    let track = builder.track(Vec::new(), vec![ps]);
    let (left, right) = padding(0.1);
    builder.step(start, left, right, vec![track]);
    let ps = builder.puzzle(&library, "GlobalMax").build();
    let track = builder.track(Vec::new(), vec![ps]);
    builder.step(end, Boundary::Point(start), Boundary::Offset(0.3), vec![track]);
    let pc = builder
        .puzzle(&library, "Duration")
        .point("start", start)
        .point("end", end)
        .output("duration", width)
        .build();
    let pc = builder.add(pc);
    let form = builder.build();

    let schema = Schema::compile(&form).unwrap();
    assert!(schema.pcs_by_step(0).is_empty());
    assert_eq!(schema.pcs_by_step(1), &[pc]);
    assert_eq!(schema.required_points_of_step(1), &[start]);
}

#[test]
fn boundary_on_a_later_point_is_an_invalid_interval() {
    let library = reference_library();
    let mut builder = FormBuilder::new("forward");
    let first = builder.point("first");
    let second = builder.point("second");
    let a = builder.parameter("a", DataType::Float);
    let ps = builder.puzzle(&library, "GlobalMax").build();
    let track = builder.track(Vec::new(), vec![ps]);
    builder.step(first, Boundary::Point(second), Boundary::Offset(0.2), vec![track]);
    let ps = builder.puzzle(&library, "GlobalMax").build();
    let track = builder.track(Vec::new(), vec![ps]);
    let (left, right) = padding(0.1);
    builder.step(second, left, right, vec![track]);
    let pc = builder
        .puzzle(&library, "Amplitude")
        .point("point", first)
        .output("amplitude", a)
        .build();
    builder.add(pc);
    let form = builder.build();

    let err = Schema::compile(&form).unwrap_err();
    assert_eq!(err.code(), codes::INVALID_INTERVAL);
    assert_eq!(err.info().context["step_num"], "0");
}

#[test]
fn invalid_form_is_rejected_before_scheduling() {
    let library = reference_library();
    let mut form = single_peak(&library).form;
    form.parameters.clear();
    let err = Schema::compile(&form).unwrap_err();
    assert_eq!(err.code(), codes::INVALID_FORM);
}

#[test]
fn analyse_lists_unused_entities() {
    let library = reference_library();
    let mut builder = FormBuilder::new("unused");
    let p1 = builder.point("p1");
    let spare = builder.point("spare");
    let a = builder.parameter("a", DataType::Float);
    let orphan = builder.parameter("orphan", DataType::Float);
    let ps = builder.puzzle(&library, "GlobalMax").build();
    let track = builder.track(Vec::new(), vec![ps]);
    let (left, right) = padding(0.1);
    builder.step(p1, left, right, vec![track]);
    let pc = builder
        .puzzle(&library, "Amplitude")
        .point("point", p1)
        .output("amplitude", a)
        .build();
    let pc = builder.add(pc);
    builder.incomplete();
    let form = builder.build();

    let report = Schema::analyse(&form);
    assert!(report.is_complete());
    assert_eq!(report.unplaced_points, vec![spare]);
    assert_eq!(report.unreferenced_points, vec![spare]);
    assert_eq!(report.unproduced_params, vec![orphan]);
    assert_eq!(report.unconsumed_pcs, vec![pc]);
    assert!(report.cycles.is_empty());
}

#[test]
fn staircase_spreads_work_over_steps() {
    let library = reference_library();
    let form = staircase(&library, 4, 2);
    let schema = Schema::compile(&form).unwrap();
    for n in 0..4 {
        let plan: &StepPlan = schema.step(n).unwrap();
        assert_eq!(plan.pcs.len(), 3);
        assert_eq!(plan.hcs.len(), 1);
    }
    let all: Vec<PuzzleId> = schema.pc_order();
    assert_eq!(all.len(), 12);
    assert_eq!(schema.hc_order().len(), 4);
}
