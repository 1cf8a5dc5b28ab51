use std::fs;
use std::path::Path;

use form_core::codes;
use form_puzzle::StrategyRegistry;
use form_testkit::reference_library;

fn write_manifest(root: &Path, folder: &str, file: &str, body: &str) {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), body).unwrap();
}

#[test]
fn discovers_only_eligible_manifests() {
    let root = tempfile::tempdir().unwrap();
    let library = reference_library();
    write_manifest(root.path(), "ps", "global_max.toml", "class = \"GlobalMax\"\nmodule = \"global_max\"\n");
    write_manifest(
        root.path(),
        "pc",
        "amplitude.toml",
        "class = \"Amplitude\"\nmodule = \"amplitude\"\ncomment = \"value at point\"\n",
    );
    // module does not match the file stem
    write_manifest(root.path(), "sm", "scale.toml", "class = \"Scale\"\nmodule = \"scaling\"\n");
    // kind does not match the folder
    write_manifest(root.path(), "hc", "sum.toml", "class = \"Sum\"\nmodule = \"sum\"\n");
    // not linked
    write_manifest(root.path(), "ps", "ghost.toml", "class = \"Ghost\"\nmodule = \"ghost\"\n");
    // unparsable
    write_manifest(root.path(), "ps", "broken.toml", "class = \n");
    // not a manifest
    write_manifest(root.path(), "ps", "notes.txt", "ignored");

    let registry = StrategyRegistry::discover(root.path(), &library).unwrap();
    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, vec!["Amplitude", "GlobalMax"]);
    assert_eq!(registry.entry("Amplitude").unwrap().comment, "value at point");
    assert!(registry
        .entry("GlobalMax")
        .unwrap()
        .source
        .as_ref()
        .unwrap()
        .ends_with("global_max.toml"));
}

#[test]
fn missing_folders_are_tolerated() {
    let root = tempfile::tempdir().unwrap();
    let registry = StrategyRegistry::discover(root.path(), &reference_library()).unwrap();
    assert!(registry.is_empty());
}

#[test]
fn root_must_exist() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("nowhere");
    let err = StrategyRegistry::discover(&missing, &reference_library()).unwrap_err();
    assert_eq!(err.code(), codes::REGISTRY_IO);
}

#[test]
fn unknown_class_lookup_fails() {
    let registry = StrategyRegistry::from_library(&reference_library());
    assert!(registry.contains("GlobalMax"));
    let err = registry.get("Nope").unwrap_err();
    assert_eq!(err.code(), codes::UNKNOWN);
    assert_eq!(err.info().context["class_name"], "Nope");
}

#[test]
fn library_rejects_duplicate_names() {
    let mut library = reference_library();
    let again = form_testkit::reference_classes().remove(0);
    let err = library.register(again).unwrap_err();
    assert_eq!(err.code(), codes::DUPLICATE_CLASS);
}
