use std::io::Write;

use form_core::codes;
use form_eval::variants::IsolationForestOpts;
use form_eval::EvaluatorConfig;
use form_run::EngineConfig;

#[test]
fn loads_a_full_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "max_pool_size: 16\nepsilon_for_dubles: 0.02\nseed: 7\nevaluator:\n  type: isolation-forest-percentile\n  trees: 40"
    )
    .unwrap();
    let config = EngineConfig::from_path(file.path()).unwrap();
    assert_eq!(config.max_pool_size, Some(16));
    assert_eq!(config.epsilon_for_dubles, 0.02);
    assert_eq!(config.seed, 7);
    assert_eq!(
        config.evaluator,
        Some(EvaluatorConfig::IsolationForestPercentile(IsolationForestOpts {
            trees: 40,
            ..IsolationForestOpts::default()
        }))
    );
}

#[test]
fn missing_file_reports_its_path() {
    let err = EngineConfig::from_path(std::path::Path::new("/nonexistent/engine.yaml")).unwrap_err();
    assert_eq!(err.code(), codes::CONFIG_PARSE);
    assert_eq!(err.info().context["path"], "/nonexistent/engine.yaml");
}

#[test]
fn tracing_can_be_initialised_twice() {
    form_run::init_tracing("debug");
    assert!(!form_run::init_tracing("info"));
}
