use form_core::errors::{codes, ErrorInfo, FormError};

#[test]
fn puzzle_errors_carry_puzzle_and_class() {
    let err = FormError::run_puzzle(codes::EXECUTION, 12, "GlobalMax", "strategy failed");
    assert_eq!(err.code(), codes::EXECUTION);
    assert_eq!(err.info().context["puzzle_id"], "12");
    assert_eq!(err.info().context["class_name"], "GlobalMax");
}

#[test]
fn missing_inputs_lists_absent_names() {
    let absent = vec!["p1".to_string(), "p3".to_string()];
    let err = FormError::missing_inputs(codes::MISSING_INPUT_POINTS, 4, "Amplitude", &absent);
    assert_eq!(err.info().context["missing"], "p1,p3");
    assert!(err.is_candidate_local());
}

#[test]
fn point_out_of_interval_reports_interval_and_point() {
    let err = FormError::point_out_of_interval(3, "FixedPoints", 0.4, 0.6, 0.9);
    assert_eq!(err.info().context["interval"], "[0.4, 0.6]");
    assert_eq!(err.info().context["point"], "0.9");
}

#[test]
fn invalid_interval_names_form_and_step() {
    let err = FormError::invalid_interval(1, Some(2), "reference point not yet placed");
    assert!(matches!(err, FormError::Form(_)));
    assert_eq!(err.info().context["form_id"], "1");
    assert_eq!(err.info().context["step_num"], "2");
}

#[test]
fn step_and_schema_errors_are_not_candidate_local() {
    let step = FormError::run_step(codes::INVALID_TARGET, 0, "target already placed");
    let schema = FormError::Schema(ErrorInfo::new(codes::SCHEMA_BLOCKED, "blocked"));
    assert!(!step.is_candidate_local());
    assert!(!schema.is_candidate_local());
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = FormError::Registry(
        ErrorInfo::new(codes::UNKNOWN, "strategy class 'Missing' is not registered")
            .with_context("class_name", "Missing")
            .with_hint("check the strategy library root"),
    );
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["family"], "Registry");
    assert_eq!(json["detail"]["code"], codes::UNKNOWN);
    assert_eq!(json["detail"]["hint"], "check the strategy library root");
    let back: FormError = serde_json::from_value(json).unwrap();
    assert_eq!(back, err);
}

#[test]
fn display_leads_with_code_and_lists_context() {
    let err = FormError::missing_inputs(
        codes::MISSING_INPUT_PARAMS,
        7,
        "Amplitude",
        &["scale".to_string()],
    )
    .with_hint("declare the parameter in an earlier step");
    let info = err.info();
    assert_eq!(info.context_value("missing"), Some("scale"));
    assert_eq!(info.context_value("absent"), None);
    assert_eq!(
        info.to_string(),
        format!(
            "[{}] required inputs are absent from the exemplar \
             (class_name=Amplitude missing=scale puzzle_id=7); \
             hint: declare the parameter in an earlier step",
            codes::MISSING_INPUT_PARAMS
        )
    );
    assert_eq!(
        ErrorInfo::new(codes::UNKNOWN, "no such class").to_string(),
        format!("[{}] no such class", codes::UNKNOWN)
    );
}

#[test]
fn name_lists_join_on_commas() {
    let err = FormError::run_puzzle(codes::MISMATCH, 2, "Relay", "input_points differ")
        .with_names("missing_on_class", &["p1", "p2"])
        .with_names("missing_in_catalogue", &Vec::<String>::new());
    assert_eq!(err.info().context_value("missing_on_class"), Some("p1,p2"));
    assert_eq!(err.info().context_value("missing_in_catalogue"), Some(""));
}
