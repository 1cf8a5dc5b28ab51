use form_core::{codes, Exemplar, ExemplarId, ParamValue};
use form_puzzle::StrategyRegistry;
use form_run::Parametriser;
use form_testkit::{reference_library, single_peak, single_peak_signal, single_peak_with_threshold};

fn pointed(t: f64) -> Exemplar {
    let mut exemplar = Exemplar::new(ExemplarId::from_raw(0), single_peak_signal(100.0));
    assert!(exemplar.add_point("p1", t, None).unwrap());
    exemplar
}

#[test]
fn computes_parameters_for_labelled_points() {
    let library = reference_library();
    let registry = StrategyRegistry::from_library(&library);
    let parametriser = Parametriser::new(&single_peak(&library).form, &registry).unwrap();
    let mut exemplar = pointed(0.5);
    assert!(parametriser.parametrise(&mut exemplar).unwrap());
    assert_eq!(exemplar.parameter("a"), Some(&ParamValue::Float(1.0)));
}

#[test]
fn reports_failed_hard_conditions() {
    let library = reference_library();
    let registry = StrategyRegistry::from_library(&library);
    let scenario = single_peak_with_threshold(&library, 0.9);
    let parametriser = Parametriser::new(&scenario.form, &registry).unwrap();

    let mut peak = pointed(0.5);
    assert!(parametriser.parametrise(&mut peak).unwrap());
    assert!(peak.passed_hcs().contains(&scenario.threshold_hc.unwrap()));

    let mut slope = pointed(0.3);
    assert!(!parametriser.parametrise(&mut slope).unwrap());
    assert!(slope.failed_hcs().contains(&scenario.threshold_hc.unwrap()));
}

#[test]
fn failure_leaves_the_exemplar_untouched() {
    let library = reference_library();
    let registry = StrategyRegistry::from_library(&library);
    let parametriser = Parametriser::new(&single_peak_with_threshold(&library, 0.5).form, &registry).unwrap();
    let mut unpointed = Exemplar::new(ExemplarId::from_raw(3), single_peak_signal(100.0));
    let before = unpointed.clone();
    let err = parametriser.parametrise(&mut unpointed).unwrap_err();
    assert_eq!(err.code(), codes::MISSING_INPUT_POINTS);
    assert_eq!(unpointed, before);
}
