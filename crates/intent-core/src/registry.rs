//! Check definitions loaded from a directory of YAML files, one check per file.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::model::{CheckDefinition, Schedule};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read checks directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read check file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse check file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Ordered check definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckSet {
    checks: Vec<CheckDefinition>,
}

impl CheckSet {
    pub fn new(checks: Vec<CheckDefinition>) -> Self {
        Self { checks }
    }

    /// First definition with this id.
    pub fn find(&self, id: &str) -> Option<&CheckDefinition> {
        self.checks.iter().find(|c| c.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|c| c.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckDefinition> {
        self.checks.iter()
    }

    pub fn definitions(&self) -> &[CheckDefinition] {
        &self.checks
    }

    pub fn summaries(&self) -> Vec<CheckSummary> {
        self.checks.iter().map(CheckSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl IntoIterator for CheckSet {
    type Item = CheckDefinition;
    type IntoIter = std::vec::IntoIter<CheckDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.checks.into_iter()
    }
}

/// Fields of a check that are safe to expose to listing clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub id: String,
    pub description: String,
    pub severity: String,
    pub schedule: Option<Schedule>,
    #[serde(rename = "assert")]
    pub assertion: Value,
    pub target: Value,
}

impl From<&CheckDefinition> for CheckSummary {
    fn from(def: &CheckDefinition) -> Self {
        Self {
            id: def.id.clone(),
            description: def.description.clone(),
            severity: def.severity.clone(),
            schedule: def.schedule,
            assertion: def.assertion.clone(),
            target: def.target.clone(),
        }
    }
}

/// Load every `*.yaml` / `*.yml` file in `dir` (not recursive), sorted by
/// file name.
///
/// Only unreadable files and broken YAML fail here. Structural problems such
/// as an unknown assertion type or an `assert:` block that is not a mapping
/// surface when the check is evaluated.
pub fn load_checks_dir(dir: &Path) -> Result<CheckSet, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_yaml(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let checks = paths
        .iter()
        .map(|p| load_check_file(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CheckSet::new(checks))
}

pub fn load_check_file(path: &Path) -> Result<CheckDefinition, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TRENDING: &str = r#"
id: trending_palm_springs
description: Palm Springs is trending in US/en-US
severity: high
schedule:
  every_seconds: 60
assert:
  type: contains_title
  title_id: t_palm_springs
target:
  region: US
  locale: en-US
"#;

    #[test]
    fn test_load_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.yaml"), TRENDING.replace("trending_palm_springs", "b")).unwrap();
        fs::write(dir.path().join("a.yml"), TRENDING.replace("trending_palm_springs", "a")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a check").unwrap();
        fs::create_dir(dir.path().join("nested.yaml")).unwrap();

        let set = load_checks_dir(dir.path()).unwrap();
        assert_eq!(set.ids().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_loaded_definition_fields() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("check.yaml"), TRENDING).unwrap();

        let set = load_checks_dir(dir.path()).unwrap();
        let def = set.find("trending_palm_springs").expect("check loaded");
        assert_eq!(def.severity, "high");
        assert_eq!(def.schedule, Some(Schedule { every_seconds: 60 }));
        assert_eq!(def.assertion_type(), Some("contains_title"));
        assert_eq!(def.target["region"], "US");
        assert!(set.find("other").is_none());
    }

    #[test]
    fn test_unknown_type_still_loads() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("bogus.yaml"),
            "id: bogus\nassert:\n  type: bogus_type\n",
        )
        .unwrap();
        let set = load_checks_dir(dir.path()).unwrap();
        assert_eq!(set.find("bogus").unwrap().assertion_type(), Some("bogus_type"));
    }

    #[test]
    fn test_non_mapping_blocks_still_load() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), TRENDING).unwrap();
        fs::write(dir.path().join("b.yaml"), "id: odd\nassert: contains_title\n").unwrap();
        fs::write(dir.path().join("c.yaml"), "id: odd_target\ntarget: [US]\n").unwrap();

        let set = load_checks_dir(dir.path()).unwrap();
        assert_eq!(
            set.ids().collect::<Vec<_>>(),
            ["trending_palm_springs", "odd", "odd_target"]
        );
        let odd = set.find("odd").unwrap();
        assert_eq!(odd.assertion, Value::from("contains_title"));
        assert_eq!(odd.assertion_type(), None);

        let summaries = serde_json::to_value(set.summaries()).unwrap();
        assert_eq!(summaries[1]["assert"], "contains_title");
        assert_eq!(summaries[2]["target"], serde_json::json!(["US"]));
    }

    #[test]
    fn test_invalid_yaml_names_the_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.yaml"), "id: [unclosed").unwrap();
        let err = load_checks_dir(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_missing_dir_is_error() {
        let dir = tempdir().unwrap();
        let err = load_checks_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, LoadError::ReadDir { .. }));
    }

    #[test]
    fn test_summary_uses_assert_key() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("check.yaml"), TRENDING).unwrap();
        let summaries = load_checks_dir(dir.path()).unwrap().summaries();
        let v = serde_json::to_value(&summaries[0]).unwrap();
        assert_eq!(v["assert"]["type"], "contains_title");
        assert_eq!(v["schedule"]["every_seconds"], 60);
    }
}
