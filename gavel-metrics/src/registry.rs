//! Metric registry loading.

use crate::error::RegistryError;
use crate::spec::MetricSpec;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One spec file that failed to load.
///
/// Per-file failures do not abort the load; the operator sees them in the
/// startup report and the remaining specs are still usable. Only a
/// duplicate name is fatal.
#[derive(Debug)]
pub struct LoadFailure {
    /// The file that failed.
    pub path: PathBuf,
    /// Why it failed.
    pub error: RegistryError,
}

/// A read-only, name-indexed collection of metric specs.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    specs: Vec<MetricSpec>,
    by_name: HashMap<String, usize>,
    failures: Vec<LoadFailure>,
}

impl MetricRegistry {
    /// Load every `*.yaml`/`*.yml` file in a directory, one spec per file.
    ///
    /// Files are visited in sorted order so registry iteration is
    /// deterministic. A malformed file is recorded in
    /// [`failures`](Self::failures) and skipped; a duplicate metric name is
    /// fatal and the whole load returns an error.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| RegistryError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        paths.sort();

        let mut registry = Self::default();
        let mut sources: HashMap<String, PathBuf> = HashMap::new();

        for path in paths {
            match MetricSpec::from_file(&path) {
                Ok(spec) => {
                    if let Some(first) = sources.get(&spec.name) {
                        return Err(RegistryError::DuplicateName {
                            name: spec.name,
                            first: first.clone(),
                            second: path,
                        });
                    }
                    debug!(metric = %spec.name, path = %path.display(), "loaded metric spec");
                    sources.insert(spec.name.clone(), path);
                    registry.by_name.insert(spec.name.clone(), registry.specs.len());
                    registry.specs.push(spec);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping invalid metric spec");
                    registry.failures.push(LoadFailure { path, error });
                }
            }
        }

        Ok(registry)
    }

    /// Build a registry from already-validated specs.
    ///
    /// Used by tests and programmatic callers; the duplicate-name rule still
    /// applies.
    pub fn from_specs(specs: Vec<MetricSpec>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for spec in specs {
            if registry.by_name.contains_key(&spec.name) {
                return Err(RegistryError::DuplicateName {
                    name: spec.name,
                    first: PathBuf::from("<memory>"),
                    second: PathBuf::from("<memory>"),
                });
            }
            registry.by_name.insert(spec.name.clone(), registry.specs.len());
            registry.specs.push(spec);
        }
        Ok(registry)
    }

    /// Look up a spec by name.
    pub fn get(&self, name: &str) -> Option<&MetricSpec> {
        self.by_name.get(name).map(|&i| &self.specs[i])
    }

    /// Iterate specs in load order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSpec> {
        self.specs.iter()
    }

    /// Number of loaded specs.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no spec loaded.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Files that failed to load.
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    /// Reject any template placeholder that no known column (plus the
    /// always-present builtins) can satisfy.
    ///
    /// Callers that know their dataset's columns run this before the first
    /// grader call, moving unresolvable-placeholder failures from render
    /// time to load time.
    pub fn validate_columns(&self, columns: &[&str]) -> Result<(), RegistryError> {
        const BUILTINS: [&str; 4] = ["id", "question", "answer", "context"];
        for spec in &self.specs {
            for placeholder in spec.required_placeholders() {
                let known = BUILTINS.contains(&placeholder) || columns.contains(&placeholder);
                if !known {
                    return Err(RegistryError::UnresolvablePlaceholder {
                        metric: spec.name.clone(),
                        placeholder: placeholder.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn spec_yaml(name: &str) -> String {
        format!(
            r#"
name: {name}
description: d
prompt_template: "Rate {{answer}} against {{question}}, 0-10."
parser: number
rai_category: quality
reflection_prompt: ""
confidence_prompt: ""
"#
        )
    }

    fn write_specs(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (file, content) in files {
            fs::write(dir.path().join(file), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_load_one_spec_per_file() {
        let dir = write_specs(&[
            ("a.yaml", &spec_yaml("accuracy")),
            ("b.yml", &spec_yaml("brevity")),
            ("notes.txt", "not a spec"),
        ]);

        let registry = MetricRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("accuracy").is_some());
        assert!(registry.get("brevity").is_some());
        assert!(registry.failures().is_empty());
    }

    #[test]
    fn test_load_order_is_sorted_by_file() {
        let dir = write_specs(&[
            ("z.yaml", &spec_yaml("zeta")),
            ("a.yaml", &spec_yaml("alpha")),
        ]);

        let registry = MetricRegistry::load(dir.path()).unwrap();
        let names: Vec<&str> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn test_malformed_file_is_isolated() {
        let dir = write_specs(&[
            ("a.yaml", &spec_yaml("accuracy")),
            ("broken.yaml", "name: [unclosed"),
        ]);

        let registry = MetricRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.failures().len(), 1);
        assert!(registry.failures()[0].path.ends_with("broken.yaml"));
    }

    #[test]
    fn test_duplicate_name_is_fatal() {
        let dir = write_specs(&[
            ("a.yaml", &spec_yaml("accuracy")),
            ("b.yaml", &spec_yaml("accuracy")),
        ]);

        let err = MetricRegistry::load(dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { name, .. } if name == "accuracy"));
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let err = MetricRegistry::load("/nonexistent/metrics").unwrap_err();
        assert!(matches!(err, RegistryError::Directory { .. }));
    }

    #[test]
    fn test_validate_columns() {
        let yaml = r#"
name: fairness
description: d
prompt_template: "Given gap {dp_diff}, rate {answer} 0-10."
parser: number
rai_category: fairness
reflection_prompt: ""
confidence_prompt: ""
"#;
        let dir = write_specs(&[("f.yaml", yaml)]);
        let registry = MetricRegistry::load(dir.path()).unwrap();

        assert!(registry.validate_columns(&["dp_diff"]).is_ok());
        let err = registry.validate_columns(&[]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnresolvablePlaceholder { placeholder, .. } if placeholder == "dp_diff"
        ));
    }

    #[test]
    fn test_builtins_always_resolvable() {
        let dir = write_specs(&[("a.yaml", &spec_yaml("accuracy"))]);
        let registry = MetricRegistry::load(dir.path()).unwrap();
        assert!(registry.validate_columns(&[]).is_ok());
    }
}
