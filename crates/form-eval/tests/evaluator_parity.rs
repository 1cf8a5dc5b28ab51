mod common;

use common::{exemplar, names};
use form_core::ParamValue;
use form_eval::variants::{EllipticOpts, KdeOpts, MahalanobisOpts};
use form_eval::{EvaluatorConfig, ReferenceTable};
use form_testkit::normal_samples;

fn standard_normal_table() -> ReferenceTable {
    ReferenceTable::from_column("a", normal_samples(50, 0.0, 1.0, 2024)).expect("table")
}

#[test]
fn centre_of_a_standard_normal_scores_at_least_half() {
    let table = standard_normal_table();
    let params = names(&["a"]);
    let at_zero = exemplar(&[("a", ParamValue::Float(0.0))]);
    let configs = [
        EvaluatorConfig::NormalisedDeviation,
        EvaluatorConfig::Kde(KdeOpts::default()),
        EvaluatorConfig::Mahalanobis(MahalanobisOpts::default()),
        EvaluatorConfig::MahalanobisPercentile(MahalanobisOpts::default()),
        EvaluatorConfig::EllipticEnvelope(EllipticOpts::default()),
    ];
    for config in configs {
        let evaluator = config.fit(&params, &table, None, 7).expect("fit");
        let score = evaluator.eval_exemplar(&at_zero).expect("score");
        assert!(score >= 0.5, "{} scored {score}", config.name());
    }
}

#[test]
fn far_tail_scores_below_centre() {
    let table = standard_normal_table();
    let params = names(&["a"]);
    let centre = exemplar(&[("a", ParamValue::Float(0.0))]);
    let tail = exemplar(&[("a", ParamValue::Float(6.0))]);
    for config in [
        EvaluatorConfig::NormalisedDeviation,
        EvaluatorConfig::Kde(KdeOpts::default()),
        EvaluatorConfig::Mahalanobis(MahalanobisOpts::default()),
    ] {
        let evaluator = config.fit(&params, &table, None, 7).expect("fit");
        let near = evaluator.eval_exemplar(&centre).expect("score");
        let far = evaluator.eval_exemplar(&tail).expect("score");
        assert!(far < near, "{}: {far} >= {near}", config.name());
    }
}

#[test]
fn single_sample_deviation_is_exact_at_the_sample() {
    let table = ReferenceTable::from_column("a", vec![0.8312]).expect("table");
    let evaluator = EvaluatorConfig::NormalisedDeviation
        .fit(&names(&["a"]), &table, None, 0)
        .expect("fit");
    let score = evaluator
        .eval_exemplar(&exemplar(&[("a", ParamValue::Float(0.8312))]))
        .expect("score");
    assert_eq!(score, 1.0);
}

#[test]
fn integer_parameters_are_numeric() {
    let table = ReferenceTable::from_column("a", vec![1.0, 2.0, 3.0]).expect("table");
    let evaluator = EvaluatorConfig::NormalisedDeviation
        .fit(&names(&["a"]), &table, None, 0)
        .expect("fit");
    let score = evaluator
        .eval_exemplar(&exemplar(&[("a", ParamValue::Int(2))]))
        .expect("score");
    assert!((score - 1.0).abs() < 1e-12);
}
