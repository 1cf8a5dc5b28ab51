//! Strategy library, discovery and the process-wide registry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use form_core::errors::{codes, ErrorInfo, FormError};
use form_core::PuzzleKind;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::descriptor::StrategyClass;
use crate::manifest::load_manifest;

/// Strategy classes linked into the process, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct StrategyLibrary {
    classes: BTreeMap<String, Arc<StrategyClass>>,
}

impl StrategyLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class; names must be unique.
    pub fn register(&mut self, class: StrategyClass) -> Result<(), FormError> {
        let name = class.name().to_string();
        if self.classes.contains_key(&name) {
            return Err(FormError::Registry(
                ErrorInfo::new(codes::DUPLICATE_CLASS, "strategy class registered twice")
                    .with_context("class_name", name),
            ));
        }
        self.classes.insert(name, Arc::new(class));
        Ok(())
    }

    /// Looks up a linked class.
    pub fn get(&self, name: &str) -> Option<&Arc<StrategyClass>> {
        self.classes.get(name)
    }

    /// Linked classes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<StrategyClass>> {
        self.classes.values()
    }

    /// Number of linked classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether nothing is linked.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Registered class with the manifest it was discovered from.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Linked class.
    pub class: Arc<StrategyClass>,
    /// Manifest path, when discovered on disk.
    pub source: Option<PathBuf>,
    /// Manifest comment.
    pub comment: String,
}

/// Read-only name to class mapping used by the binder.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl StrategyRegistry {
    /// Registers every class of the library without touching the disk.
    pub fn from_library(library: &StrategyLibrary) -> Self {
        let entries = library
            .iter()
            .map(|class| {
                (
                    class.name().to_string(),
                    RegistryEntry {
                        class: Arc::clone(class),
                        source: None,
                        comment: String::new(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Walks `root/{sm,ps,pc,hc}` and registers every eligible manifest.
    ///
    /// A manifest is eligible when its module equals the file stem and the
    /// library links a class of that name whose kind matches the folder.
    /// Ineligible files are skipped with a warning.
    pub fn discover(root: &Path, library: &StrategyLibrary) -> Result<Self, FormError> {
        if !root.is_dir() {
            return Err(FormError::Registry(
                ErrorInfo::new(codes::REGISTRY_IO, "strategy library root is not a directory")
                    .with_context("path", root.display().to_string()),
            ));
        }
        let mut entries = BTreeMap::new();
        for kind in PuzzleKind::ALL {
            let folder = root.join(kind.folder());
            if !folder.is_dir() {
                debug!(path = %folder.display(), "strategy folder absent");
                continue;
            }
            let walker = WalkDir::new(&folder)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name();
            for entry in walker.into_iter().filter_map(Result::ok) {
                let path = entry.path();
                if !entry.file_type().is_file()
                    || path.extension().and_then(|ext| ext.to_str()) != Some("toml")
                {
                    continue;
                }
                let manifest = match load_manifest(path) {
                    Ok(manifest) => manifest,
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "skipping unreadable manifest");
                        continue;
                    }
                };
                let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("");
                if manifest.module != stem {
                    warn!(
                        path = %path.display(),
                        module = %manifest.module,
                        "module name does not match file name"
                    );
                    continue;
                }
                let Some(class) = library.get(&manifest.class) else {
                    warn!(class = %manifest.class, "class is not linked into the library");
                    continue;
                };
                if class.kind() != kind {
                    warn!(
                        class = %manifest.class,
                        folder = kind.folder(),
                        actual = %class.kind(),
                        "class does not implement the folder's kind"
                    );
                    continue;
                }
                if entries.contains_key(&manifest.class) {
                    warn!(class = %manifest.class, path = %path.display(), "duplicate manifest ignored");
                    continue;
                }
                entries.insert(
                    manifest.class.clone(),
                    RegistryEntry {
                        class: Arc::clone(class),
                        source: Some(path.to_path_buf()),
                        comment: manifest.comment,
                    },
                );
            }
        }
        info!(root = %root.display(), classes = entries.len(), "strategy registry discovered");
        Ok(Self { entries })
    }

    /// Looks up a class; `Unknown` when absent.
    pub fn get(&self, name: &str) -> Result<Arc<StrategyClass>, FormError> {
        self.entries
            .get(name)
            .map(|entry| Arc::clone(&entry.class))
            .ok_or_else(|| FormError::unknown_class(name))
    }

    /// Registered entry with provenance.
    pub fn entry(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static GLOBAL: Lazy<RwLock<Option<Arc<StrategyRegistry>>>> = Lazy::new(|| RwLock::new(None));

/// Installs the process-wide registry; only the first call succeeds.
pub fn install(registry: StrategyRegistry) -> Result<Arc<StrategyRegistry>, FormError> {
    let mut slot = GLOBAL.write();
    if slot.is_some() {
        return Err(FormError::Registry(ErrorInfo::new(
            codes::ALREADY_INSTALLED,
            "strategy registry is already installed",
        )));
    }
    let registry = Arc::new(registry);
    *slot = Some(Arc::clone(&registry));
    Ok(registry)
}

/// Process-wide registry.
pub fn global() -> Result<Arc<StrategyRegistry>, FormError> {
    GLOBAL.read().clone().ok_or_else(|| {
        FormError::Registry(
            ErrorInfo::new(codes::NOT_INSTALLED, "strategy registry is not installed")
                .with_hint("call registry::install at startup"),
        )
    })
}

/// Replaces the process-wide registry.
#[cfg(feature = "test-support")]
pub fn reload(registry: StrategyRegistry) -> Arc<StrategyRegistry> {
    let registry = Arc::new(registry);
    *GLOBAL.write() = Some(Arc::clone(&registry));
    registry
}
