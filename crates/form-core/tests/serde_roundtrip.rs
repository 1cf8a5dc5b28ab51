use form_core::{Boundary, DataType, Form, FormId, PointId, PuzzleKind, Signal};

const FORM_YAML: &str = r#"
id: 1
name: single-peak
points:
  - { id: 10, name: p1 }
parameters:
  - { id: 20, name: a, data_type: float }
steps:
  - num_in_form: 0
    target_point: 10
    left_boundary: { offset: -0.1 }
    right_boundary: { offset: 0.1 }
    tracks:
      - id: 30
        pss:
          - id: 40
            name: max
            class_ref:
              id: 50
              name: GlobalMax
              kind: PS
hc_pc_objects:
  - id: 41
    name: amplitude
    class_ref:
      id: 51
      name: Amplitude
      kind: PC
      input_points: [{ id: 60, name: point }]
      output_params: [{ id: 61, name: amplitude, data_type: float }]
    input_point_values: [{ input: 60, point: 10 }]
    output_param_values: [{ slot: 61, parameter: 20 }]
"#;

#[test]
fn form_hydrates_from_yaml_and_validates() {
    let form: Form = serde_yaml::from_str(FORM_YAML).unwrap();
    assert_eq!(form.id, FormId::from_raw(1));
    assert!(form.complete);
    assert_eq!(form.steps[0].left_boundary, Boundary::Offset(-0.1));
    assert_eq!(form.parameters[0].data_type, DataType::Float);
    assert_eq!(form.puzzles[0].kind(), PuzzleKind::Pc);
    assert!(!form.puzzles[0].overwrite);
    assert_eq!(form.point_name(PointId::from_raw(10)).unwrap(), "p1");
    form.validate().unwrap();
}

#[test]
fn form_round_trips_through_json() {
    let form: Form = serde_yaml::from_str(FORM_YAML).unwrap();
    let json = serde_json::to_string_pretty(&form).expect("serialize");
    assert!(json.contains("hc_pc_objects"));
    let decoded: Form = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, form);
    assert_eq!(
        form_core::stable_hash_string(&decoded).unwrap(),
        form_core::stable_hash_string(&form).unwrap()
    );
}

#[test]
fn validation_rejects_uncovered_points_when_complete() {
    let mut form: Form = serde_yaml::from_str(FORM_YAML).unwrap();
    form.points.push(form_core::Point {
        id: PointId::from_raw(11),
        name: "p2".into(),
        comment: String::new(),
    });
    assert!(form.validate().is_err());
    form.complete = false;
    form.validate().unwrap();
}

#[test]
fn validation_rejects_misplaced_kinds() {
    let mut form: Form = serde_yaml::from_str(FORM_YAML).unwrap();
    form.puzzles[0].class_ref.kind = PuzzleKind::Sm;
    let err = form.validate().unwrap_err();
    assert_eq!(err.code(), form_core::codes::INVALID_FORM);
}

#[test]
fn boundaries_hydrate_from_point_or_offset_maps() {
    let point: Boundary = serde_yaml::from_str("{ point: 10 }").unwrap();
    assert_eq!(point, Boundary::Point(PointId::from_raw(10)));
    let offset: Boundary = serde_yaml::from_str("offset: 0.25").unwrap();
    assert_eq!(offset, Boundary::Offset(0.25));

    let json = serde_json::to_string(&Boundary::Point(PointId::from_raw(7))).unwrap();
    assert_eq!(json, r#"{"point":7}"#);
    let json = serde_json::to_string(&Boundary::Offset(-0.1)).unwrap();
    assert_eq!(json, r#"{"offset":-0.1}"#);
}

#[test]
fn boundaries_need_exactly_one_column() {
    assert!(serde_yaml::from_str::<Boundary>("{ point: 10, offset: 0.1 }").is_err());
    assert!(serde_yaml::from_str::<Boundary>("{}").is_err());
    assert!(serde_yaml::from_str::<Boundary>("{ anchor: 1 }").is_err());
}

#[test]
fn signal_fragment_round_trips_through_json() {
    let signal = Signal::new((0..50).map(|i| i as f64).collect(), 100.0).unwrap();
    let fragment = signal.get_fragment(0.1, 0.2).unwrap();
    let json = serde_json::to_string(&fragment).unwrap();
    let decoded: Signal = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, fragment);
    assert_eq!(decoded.start_time(), fragment.start_time());
    assert_eq!(decoded.samples(), fragment.samples());
}
