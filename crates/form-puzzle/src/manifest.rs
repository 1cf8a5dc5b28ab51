//! Per-file strategy manifests found under a library root.

use std::fs;
use std::path::Path;

use form_core::errors::{codes, ErrorInfo, FormError};
use serde::{Deserialize, Serialize};

/// Declaration of one strategy class in the library tree.
///
/// The file lives in the subfolder of its kind and its stem must equal
/// `module`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyManifest {
    /// Class name referenced by the catalogue.
    pub class: String,
    /// Module name; must match the file stem.
    pub module: String,
    /// Free comment.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

/// Reads and parses a TOML manifest.
pub fn load_manifest(path: &Path) -> Result<StrategyManifest, FormError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        FormError::Registry(
            ErrorInfo::new(codes::REGISTRY_IO, format!("failed to read manifest: {err}"))
                .with_context("path", path.display().to_string()),
        )
    })?;
    toml::from_str(&contents).map_err(|err| {
        FormError::Registry(
            ErrorInfo::new(codes::MANIFEST, err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}
