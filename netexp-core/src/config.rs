//! Experiment configuration and manifest loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Result;
use crate::{
    DEFAULT_ARCHIVE_DIR_NAME, DEFAULT_SCRATCH_DIR_NAME, DEFAULT_TRIAL_COUNT,
    EXPERIMENT_MANIFEST_FILE,
};

/// What the trial loop does after a trial fails.
///
/// `AbortRun` reproduces the historical behavior of the harness: the
/// first failed trial ends the whole run, with previously archived
/// trials remaining valid. `SkipTrial` logs the failure, records it in
/// the run summary and moves on to the next trial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialErrorPolicy {
    AbortRun,
    SkipTrial,
}

impl Default for TrialErrorPolicy {
    fn default() -> Self {
        TrialErrorPolicy::AbortRun
    }
}

impl FromStr for TrialErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, String> {
        match s {
            "abort_run" | "abort-run" | "abort" => Ok(TrialErrorPolicy::AbortRun),
            "skip_trial" | "skip-trial" | "skip" => Ok(TrialErrorPolicy::SkipTrial),
            _ => Err(format!("unknown trial error policy: {}", s)),
        }
    }
}

/// Full configuration of an experiment run.
///
/// Loaded from an `experiment.toml` manifest, every field optional with
/// defaults matching the historical layout (`tmp` scratch next to an
/// `out` archive root, twenty trials). Relative paths in a manifest are
/// resolved against the manifest's own directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Number of trials to perform.
    pub trials: usize,
    /// Scratch workspace the stages run against, reset before each trial.
    pub scratch_dir: PathBuf,
    /// Archive root under which one entry per successful trial appears.
    pub archive_dir: PathBuf,
    /// Generation stage executable.
    pub generate: PathBuf,
    /// Simulation stage executable.
    pub simulate: PathBuf,
    /// What happens to the run after a failed trial.
    pub on_trial_error: TrialErrorPolicy,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            trials: DEFAULT_TRIAL_COUNT,
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR_NAME),
            archive_dir: PathBuf::from(DEFAULT_ARCHIVE_DIR_NAME),
            generate: PathBuf::from("./generate"),
            simulate: PathBuf::from("./simulate"),
            on_trial_error: TrialErrorPolicy::default(),
        }
    }
}

impl ExperimentConfig {
    /// Reads configuration from a manifest file, or from the
    /// `experiment.toml` found in a directory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let manifest = if path.is_dir() {
            path.join(EXPERIMENT_MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };
        let contents = fs::read_to_string(&manifest)?;
        let mut config: ExperimentConfig = toml::from_str(&contents)?;
        if let Some(base) = manifest.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Resolves relative paths against the given base directory.
    fn rebase(&mut self, base: &Path) {
        fn rebase_one(base: &Path, path: &mut PathBuf) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        rebase_one(base, &mut self.scratch_dir);
        rebase_one(base, &mut self.archive_dir);
        rebase_one(base, &mut self.generate);
        rebase_one(base, &mut self.simulate);
    }
}

#[test]
fn config_defaults_from_empty_manifest() {
    let config: ExperimentConfig = toml::from_str("").unwrap();
    assert_eq!(config.trials, DEFAULT_TRIAL_COUNT);
    assert_eq!(config.scratch_dir, PathBuf::from(DEFAULT_SCRATCH_DIR_NAME));
    assert_eq!(config.archive_dir, PathBuf::from(DEFAULT_ARCHIVE_DIR_NAME));
    assert_eq!(config.on_trial_error, TrialErrorPolicy::AbortRun);
}

#[test]
fn config_full_manifest() {
    let config: ExperimentConfig = toml::from_str(
        r#"
trials = 3
scratch_dir = "work"
archive_dir = "results"
generate = "./bin/generate"
simulate = "./bin/simulate"
on_trial_error = "skip_trial"
"#,
    )
    .unwrap();
    assert_eq!(config.trials, 3);
    assert_eq!(config.scratch_dir, PathBuf::from("work"));
    assert_eq!(config.archive_dir, PathBuf::from("results"));
    assert_eq!(config.on_trial_error, TrialErrorPolicy::SkipTrial);
}

#[test]
fn policy_from_str() {
    assert_eq!(
        "abort_run".parse::<TrialErrorPolicy>().unwrap(),
        TrialErrorPolicy::AbortRun
    );
    assert_eq!(
        "skip-trial".parse::<TrialErrorPolicy>().unwrap(),
        TrialErrorPolicy::SkipTrial
    );
    assert!("retry".parse::<TrialErrorPolicy>().is_err());
}
