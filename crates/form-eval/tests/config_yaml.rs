use form_eval::variants::{EllipticOpts, KdeOpts, MlpOpts};
use form_eval::EvaluatorConfig;

#[test]
fn kebab_case_tag_selects_variant() {
    let config: EvaluatorConfig = serde_yaml::from_str("type: elliptic-envelope\nsupport_fraction: 0.8\n").expect("yaml");
    assert_eq!(
        config,
        EvaluatorConfig::EllipticEnvelope(EllipticOpts {
            support_fraction: 0.8,
            ..EllipticOpts::default()
        })
    );
}

#[test]
fn omitted_hyperparameters_take_defaults() {
    let kde: EvaluatorConfig = serde_yaml::from_str("type: kde").expect("yaml");
    assert_eq!(kde, EvaluatorConfig::Kde(KdeOpts::default()));
    let mlp: EvaluatorConfig = serde_yaml::from_str("type: mlp-binary\nhidden: 4").expect("yaml");
    assert_eq!(
        mlp,
        EvaluatorConfig::MlpBinary(MlpOpts {
            hidden: 4,
            ..MlpOpts::default()
        })
    );
    assert!(mlp.is_binary());
    let plain: EvaluatorConfig = serde_yaml::from_str("type: normalised-deviation").expect("yaml");
    assert_eq!(plain, EvaluatorConfig::NormalisedDeviation);
}

#[test]
fn unknown_variant_is_rejected() {
    assert!(serde_yaml::from_str::<EvaluatorConfig>("type: random-forest").is_err());
}
