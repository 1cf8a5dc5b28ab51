use form_core::{codes, ParamValue, PuzzleId};
use form_puzzle::StrategyRegistry;
use form_run::{LabelledDataset, LabelledRecord};
use form_testkit::{reference_library, single_peak_signal, single_peak_with_threshold};
use indexmap::IndexMap;

fn record(patient: &str, point: &str, t: f64) -> LabelledRecord {
    LabelledRecord {
        patient_id: patient.to_string(),
        lead: "ii".to_string(),
        signal: single_peak_signal(100.0),
        points: IndexMap::from([(point.to_string(), t)]),
    }
}

fn dataset() -> (LabelledDataset, PuzzleId) {
    let library = reference_library();
    let registry = StrategyRegistry::from_library(&library);
    let scenario = single_peak_with_threshold(&library, 0.9);
    let records = vec![
        record("p-001", "p1", 0.5),
        record("p-002", "p1", 0.3),
        record("p-003", "p1", 5.0),
        record("p-004", "qrs", 0.5),
    ];
    let dataset = LabelledDataset::build(&scenario.form, &registry, &records).unwrap();
    (dataset, scenario.threshold_hc.unwrap())
}

#[test]
fn frames_hold_one_row_per_parametrised_record() {
    let (dataset, hc) = dataset();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.parameters_frame().columns, vec!["a".to_string()]);
    assert_eq!(dataset.violations_frame().columns, vec![hc]);
    let values = dataset.parameter_values("a").unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0], ParamValue::Float(1.0));
    assert_eq!(dataset.parameter_values("b").unwrap_err().code(), codes::DATASET_COLUMN);
}

#[test]
fn failing_records_are_skipped_with_reasons() {
    let (dataset, _) = dataset();
    let skipped: Vec<(&str, &str)> = dataset
        .skipped()
        .iter()
        .map(|s| (s.key.patient_id.as_str(), s.error.code()))
        .collect();
    assert_eq!(
        skipped,
        vec![("p-003", codes::DATASET_SHAPE), ("p-004", codes::DATASET_COLUMN)]
    );
}

#[test]
fn violations_are_queryable_by_record() {
    let (dataset, hc) = dataset();
    let any: Vec<String> = dataset.ids_with_any_violation().iter().map(|k| k.to_string()).collect();
    assert_eq!(any, vec!["p-002/ii".to_string()]);
    assert_eq!(dataset.ids_with_violation(hc).unwrap().len(), 1);
    let err = dataset.ids_with_violation(PuzzleId::from_raw(1)).unwrap_err();
    assert_eq!(err.code(), codes::DATASET_COLUMN);
}

#[test]
fn reference_table_can_exclude_violations() {
    let (dataset, _) = dataset();
    let columns = vec!["a".to_string()];
    assert_eq!(dataset.to_reference_table(&columns, false).unwrap().len(), 2);
    let clean = dataset.to_reference_table(&columns, true).unwrap();
    assert_eq!(clean.rows(), &[vec![1.0]]);
}

#[test]
fn frames_export_as_csv() {
    let (dataset, hc) = dataset();
    let mut buffer = Vec::new();
    dataset.write_parameters_csv(&mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("patient_id,lead,a"));
    assert_eq!(lines.next(), Some("p-001,ii,1"));

    let dir = tempfile::tempdir().unwrap();
    dataset.export_csv(dir.path()).unwrap();
    let violations = std::fs::read_to_string(dir.path().join("violations.csv")).unwrap();
    assert_eq!(violations.lines().next(), Some(format!("patient_id,lead,{hc}").as_str()));
    assert!(violations.contains("p-002,ii,true"));
}
