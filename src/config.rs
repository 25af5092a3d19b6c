//! Run configuration
//!
//! A [`MergeConfig`] names the five input files, the output file and the
//! knobs that change aggregation. It is either built from an input directory
//! using the export tools' default file names or loaded from a JSON file:
//!
//! ```json
//! {
//!   "sources": {
//!     "concept2": "data/concept2-season-2026-2.csv",
//!     "whoop_workouts": "data/workouts.csv",
//!     "whoop_cycles": "data/physiological_cycles.csv",
//!     "whoop_sleeps": "data/sleeps.csv",
//!     "apple_health": "data/Export.csv"
//!   },
//!   "output": "master_daily.csv",
//!   "invalid_day_policy": "drop",
//!   "apple_reducers": { "Step Count (count)": "sum" }
//! }
//! ```
//!
//! Relative paths in a config file resolve against the file's directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::InvalidDayPolicy;
use crate::encoder::OutputFormat;
use crate::error::{MergeError, Result};
use crate::reducer::Reducer;
use crate::types::SourceKind;

/// Default master table file name
pub const DEFAULT_OUTPUT_FILE: &str = "master_daily.csv";

/// One path per source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePaths {
    pub concept2: PathBuf,
    pub whoop_workouts: PathBuf,
    pub whoop_cycles: PathBuf,
    pub whoop_sleeps: PathBuf,
    pub apple_health: PathBuf,
}

impl SourcePaths {
    /// Default export file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            concept2: dir.join(SourceKind::Concept2.default_file_name()),
            whoop_workouts: dir.join(SourceKind::WhoopWorkouts.default_file_name()),
            whoop_cycles: dir.join(SourceKind::WhoopCycles.default_file_name()),
            whoop_sleeps: dir.join(SourceKind::WhoopSleeps.default_file_name()),
            apple_health: dir.join(SourceKind::AppleHealth.default_file_name()),
        }
    }

    pub fn get(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Concept2 => &self.concept2,
            SourceKind::WhoopWorkouts => &self.whoop_workouts,
            SourceKind::WhoopCycles => &self.whoop_cycles,
            SourceKind::WhoopSleeps => &self.whoop_sleeps,
            SourceKind::AppleHealth => &self.apple_health,
        }
    }

    /// Sources paired with their paths, in merge order
    pub fn iter(&self) -> impl Iterator<Item = (SourceKind, &Path)> + '_ {
        SourceKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.concept2,
            &mut self.whoop_workouts,
            &mut self.whoop_cycles,
            &mut self.whoop_sleeps,
            &mut self.apple_health,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Full run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    pub sources: SourcePaths,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub invalid_day_policy: InvalidDayPolicy,
    /// Declared reducers for Apple Health columns; others use the name heuristic
    #[serde(default)]
    pub apple_reducers: BTreeMap<String, Reducer>,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_FILE)
}

impl MergeConfig {
    /// Default layout: all inputs and the output inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            sources: SourcePaths::in_dir(dir),
            output: dir.join(DEFAULT_OUTPUT_FILE),
            output_format: OutputFormat::default(),
            invalid_day_policy: InvalidDayPolicy::default(),
            apple_reducers: BTreeMap::new(),
        }
    }

    /// Parse a JSON config without touching the filesystem
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file, resolving relative paths against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            MergeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json(&text)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.sources.resolve_against(base);
        if config.output.is_relative() {
            config.output = base.join(&config.output);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_in_dir_uses_default_names() {
        let config = MergeConfig::in_dir(Path::new("/data"));

        assert_eq!(
            config.sources.concept2,
            PathBuf::from("/data/concept2-season-2026-2.csv")
        );
        assert_eq!(config.sources.apple_health, PathBuf::from("/data/Export.csv"));
        assert_eq!(config.output, PathBuf::from("/data/master_daily.csv"));
        assert_eq!(config.invalid_day_policy, InvalidDayPolicy::Drop);
    }

    #[test]
    fn test_iter_is_merge_order() {
        let paths = SourcePaths::in_dir(Path::new("d"));
        let kinds: Vec<_> = paths.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, SourceKind::ALL.to_vec());
    }

    #[test]
    fn test_from_json_defaults() {
        let config = MergeConfig::from_json(
            r#"{
                "sources": {
                    "concept2": "c2.csv",
                    "whoop_workouts": "w.csv",
                    "whoop_cycles": "c.csv",
                    "whoop_sleeps": "s.csv",
                    "apple_health": "a.csv"
                },
                "apple_reducers": { "Step Count (count)": "sum" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT_FILE));
        assert_eq!(config.output_format, OutputFormat::Csv);
        assert_eq!(
            config.apple_reducers.get("Step Count (count)"),
            Some(&Reducer::Sum)
        );
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let err = MergeConfig::from_json(r#"{ "sources": { "concept2": "c2.csv" } }"#).unwrap_err();
        assert!(matches!(err, MergeError::Json(_)));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitmerge.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "sources": {{
                    "concept2": "in/c2.csv",
                    "whoop_workouts": "/abs/w.csv",
                    "whoop_cycles": "in/c.csv",
                    "whoop_sleeps": "in/s.csv",
                    "apple_health": "in/a.csv"
                }},
                "output": "out/master.csv",
                "invalid_day_policy": "fail",
                "output_format": "ndjson"
            }}"#
        )
        .unwrap();

        let config = MergeConfig::load(&path).unwrap();

        assert_eq!(config.sources.concept2, dir.path().join("in/c2.csv"));
        assert_eq!(config.sources.whoop_workouts, PathBuf::from("/abs/w.csv"));
        assert_eq!(config.output, dir.path().join("out/master.csv"));
        assert_eq!(config.invalid_day_policy, InvalidDayPolicy::Fail);
        assert_eq!(config.output_format, OutputFormat::Ndjson);
    }

    #[test]
    fn test_unreadable_config_is_config_error() {
        let err = MergeConfig::load(Path::new("/nonexistent/fitmerge.json")).unwrap_err();
        assert!(matches!(err, MergeError::Config(_)));
    }
}
