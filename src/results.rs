//! Result artifact persistence.
//!
//! One invocation owns a single timestamped results root; each retained
//! prompt group gets a subdirectory, and each (prompt, option-set) pair
//! gets one plain-text artifact with the fixed four-section layout.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::sweep::{OptionSet, SweepPoint};

/// The per-invocation results directory (`results_<YYYYMMDDHHMMSS>`).
///
/// Created exactly once at orchestrator start and threaded through every
/// persistence call; there is no global path state.
#[derive(Debug)]
pub struct ResultsRoot {
    path: PathBuf,
}

impl ResultsRoot {
    /// Create the results root under `parent`, named with the current local
    /// timestamp. Fails if the directory already exists (timestamp
    /// collision) or cannot be created.
    pub fn create(parent: &Path) -> Result<Self> {
        let name = format!("results_{}", Local::now().format("%Y%m%d%H%M%S"));
        let path = parent.join(name);
        fs::create_dir(&path)
            .with_context(|| format!("failed to create results directory {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Create the subdirectory for one prompt group. Fatal if it already
    /// exists, matching the root-creation policy.
    pub fn create_group_dir(&self, group: &str) -> Result<PathBuf> {
        let dir = self.path.join(group);
        fs::create_dir(&dir)
            .with_context(|| format!("failed to create group directory {}", dir.display()))?;
        Ok(dir)
    }
}

/// Suffix disambiguating the option sets of one prompt: `label=value` for a
/// point that varied a single axis, the zero-based ordinal otherwise.
/// Either scheme is collision-free within one builder output.
pub fn artifact_suffix(point: &SweepPoint, index: usize) -> String {
    match &point.axis {
        Some((label, value)) => format!("{label}={value}"),
        None => index.to_string(),
    }
}

/// Artifact path for one run: `<group_dir>/<prompt_id>_<suffix>`, no
/// extension.
pub fn artifact_path(group_dir: &Path, prompt_id: &str, point: &SweepPoint, index: usize) -> PathBuf {
    group_dir.join(format!("{prompt_id}_{}", artifact_suffix(point, index)))
}

/// Write one result artifact, overwriting any existing file at `path`.
pub fn write_artifact(
    path: &Path,
    prompt_text: &str,
    options: &OptionSet,
    response_text: &str,
) -> Result<()> {
    let contents = format!(
        "# Prompt\n{prompt_text}\n\n## Options\n{options}\n\n# Response\n{response_text}\n"
    );
    fs::write(path, contents)
        .with_context(|| format!("failed to write result artifact {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::{build_sweep, OptionValue, SweepStrategy, SweptAxis};
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn point_with_axis(label: &str, value: OptionValue) -> SweepPoint {
        SweepPoint {
            options: OptionSet::new(),
            axis: Some((label.to_string(), value)),
        }
    }

    #[test]
    fn test_results_root_name_is_timestamped() {
        let dir = tempdir().unwrap();
        let root = ResultsRoot::create(dir.path()).unwrap();
        let name = root.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("results_"));
        let stamp = &name["results_".len()..];
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_existing_group_dir_is_fatal() {
        let dir = tempdir().unwrap();
        let root = ResultsRoot::create(dir.path()).unwrap();
        root.create_group_dir("basic").unwrap();
        assert!(root.create_group_dir("basic").is_err());
    }

    #[test]
    fn test_axis_suffix_carries_label_and_value() {
        let point = point_with_axis("temp", OptionValue::Float(1.0));
        assert_eq!(artifact_suffix(&point, 7), "temp=1.0");
        let point = point_with_axis("top_k", OptionValue::Int(40));
        assert_eq!(artifact_suffix(&point, 0), "top_k=40");
    }

    #[test]
    fn test_index_suffix_for_axisless_points() {
        let point = SweepPoint {
            options: OptionSet::new(),
            axis: None,
        };
        assert_eq!(artifact_suffix(&point, 0), "0");
        assert_eq!(artifact_suffix(&point, 11), "11");
    }

    #[test]
    fn test_paths_unique_across_builder_output() {
        let mut base = OptionSet::new();
        base.set("seed", OptionValue::Int(42));
        let axes = vec![
            SweptAxis {
                name: "temperature".into(),
                label: "temp".into(),
                values: vec![OptionValue::Float(0.0), OptionValue::Float(0.1)],
            },
            SweptAxis {
                name: "top_k".into(),
                label: "top_k".into(),
                values: vec![OptionValue::Int(1), OptionValue::Int(2), OptionValue::Int(3)],
            },
        ];
        let group_dir = Path::new("results_x/basic");
        for strategy in [SweepStrategy::Independent, SweepStrategy::Cartesian] {
            let points = build_sweep(&base, &axes, strategy);
            let paths: HashSet<PathBuf> = points
                .iter()
                .enumerate()
                .map(|(i, p)| artifact_path(group_dir, "greet", p, i))
                .collect();
            assert_eq!(paths.len(), points.len(), "{strategy:?}");
        }
    }

    #[test]
    fn test_artifact_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("greet_temp=1.0");
        let mut options = OptionSet::new();
        options.set("seed", OptionValue::Int(42));
        options.set("num_predict", OptionValue::Null);
        options.set("temperature", OptionValue::Float(1.0));
        write_artifact(&path, "Hello", &options, "Hi there!").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "# Prompt\nHello\n\n## Options\n\
             {'seed': 42, 'num_predict': None, 'temperature': 1.0}\n\n\
             # Response\nHi there!\n"
        );
    }

    #[test]
    fn test_artifact_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("greet_0");
        let options = OptionSet::new();
        write_artifact(&path, "p", &options, "first").unwrap();
        write_artifact(&path, "p", &options, "second").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("second"));
        assert!(!contents.contains("first"));
    }
}
