//! Raw YAML configuration documents with `include` inheritance.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value as Yaml};
use tracing::debug;

use crate::error::{EtlError, Result};

const INCLUDE_KEY: &str = "include";

/// A loaded configuration document, after its `include` has been merged in.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    root: Yaml,
}

impl ConfigDocument {
    /// Load a YAML file, resolving a single level of `include`.
    ///
    /// The include path is relative to the directory of `path` unless absolute.
    /// The child document is merged recursively over the base and the
    /// `include` key is removed from the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut root = read_yaml(path)?;

        let include = match &root {
            Yaml::Mapping(map) => map.get(INCLUDE_KEY).cloned(),
            _ => None,
        };

        if let Some(include) = include {
            let include = include.as_str().ok_or_else(|| {
                EtlError::Config(format!(
                    "'{}' in {} must be a file path",
                    INCLUDE_KEY,
                    path.display()
                ))
            })?;
            let base_path = resolve_include(path, include);
            debug!(config = %path.display(), base = %base_path.display(), "merging included config");

            let base = read_yaml(&base_path)?;
            root = merge(base, root);
            if let Yaml::Mapping(map) = &mut root {
                map.remove(INCLUDE_KEY);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    /// Build a document from YAML text. `include` is not resolved.
    pub fn parse(yaml: &str) -> Result<Self> {
        let root = serde_yaml::from_str(yaml).map_err(|source| EtlError::Yaml {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Ok(Self {
            path: PathBuf::from("<inline>"),
            root: normalize_root(root),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Yaml {
        &self.root
    }

    /// Look up a value by dotted path, e.g. `processing.cleaning.remove_total_rows`.
    ///
    /// Returns `None` when any segment is missing or a non-mapping is traversed.
    pub fn get(&self, dotted: &str) -> Option<&Yaml> {
        dotted.split('.').try_fold(&self.root, |node, key| match node {
            Yaml::Mapping(map) => map.get(key),
            _ => None,
        })
    }

    /// Typed dotted-path lookup falling back to `default` when the key is
    /// absent or has the wrong shape.
    pub fn get_or<T: DeserializeOwned>(&self, dotted: &str, default: T) -> T {
        self.get(dotted)
            .and_then(|v| serde_yaml::from_value(v.clone()).ok())
            .unwrap_or(default)
    }

    /// Deserialize the whole document.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_yaml::from_value(self.root.clone()).map_err(|source| EtlError::Yaml {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_yaml(path: &Path) -> Result<Yaml> {
    let text = fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?;
    let value: Yaml = serde_yaml::from_str(&text).map_err(|source| EtlError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_root(value))
}

// An empty file parses as null; treat it as an empty mapping.
fn normalize_root(value: Yaml) -> Yaml {
    match value {
        Yaml::Null => Yaml::Mapping(Mapping::new()),
        other => other,
    }
}

fn resolve_include(config_path: &Path, include: &str) -> PathBuf {
    let include = Path::new(include);
    if include.is_absolute() {
        return include.to_path_buf();
    }
    config_path
        .parent()
        .map(|dir| dir.join(include))
        .unwrap_or_else(|| include.to_path_buf())
}

/// Recursively merge `overlay` over `base`. Mappings merge key by key; any
/// other value in the overlay replaces the base value.
pub fn merge(base: Yaml, overlay: Yaml) -> Yaml {
    match (base, overlay) {
        (Yaml::Mapping(mut base), Yaml::Mapping(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Yaml::Mapping(base)
        }
        (_, overlay) => overlay,
    }
}
