//! Experiment trial loop.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::archive::ArchiveRoot;
use crate::artifact::ArtifactSet;
use crate::config::{ExperimentConfig, TrialErrorPolicy};
use crate::error::{Error, Result};
use crate::stage::{StageKind, StagePipeline};
use crate::{plot, workspace, ARTIFACT_FILES};

/// The six steps a trial moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resetting,
    Generating,
    Simulating,
    Reading,
    Plotting,
    Saving,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Resetting => "Resetting",
            Phase::Generating => "Generating",
            Phase::Simulating => "Simulating",
            Phase::Reading => "Reading data",
            Phase::Plotting => "Plotting",
            Phase::Saving => "Saving",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Receives progress notifications from the trial loop.
///
/// The loop itself has no output device of its own; anything wanting to
/// present progress implements this and gets told about each phase
/// transition and each fully archived trial.
pub trait ExperimentObserver {
    fn phase_changed(&mut self, trial_index: usize, phase: Phase) {
        let _ = (trial_index, phase);
    }
    fn trial_completed(&mut self, completed: usize, total: usize) {
        let _ = (completed, total);
    }
}

/// Observer that ignores everything, for headless or embedded use.
pub struct NullObserver;

impl ExperimentObserver for NullObserver {}

/// Outcome of a whole run.
#[derive(Debug)]
pub struct RunSummary {
    /// Trials that went through all six phases and were archived.
    pub completed: usize,
    /// Trials given up on under the `skip_trial` policy.
    pub failed: Vec<(usize, Error)>,
    /// Whether the run was stopped early through the run flag.
    pub interrupted: bool,
}

/// Drives repeated trials of the two-stage pipeline.
///
/// Strictly sequential: a trial owns the scratch workspace from its
/// reset until its archival, and the next trial only starts after that.
/// The stage processes are blocking calls with no timeout; a hung stage
/// blocks the run (a known limitation of the pipeline contract, the run
/// flag is only consulted between trials).
pub struct Experiment {
    config: ExperimentConfig,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Self {
        Experiment { config }
    }

    /// Creates an experiment from a manifest file or directory.
    pub fn from_manifest_at<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Experiment::new(ExperimentConfig::from_path(path)?))
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Runs every configured trial to completion.
    pub fn run(&self, observer: &mut dyn ExperimentObserver) -> Result<RunSummary> {
        self.run_interruptible(observer, Arc::new(AtomicBool::new(true)))
    }

    /// Runs trials while the flag stays true; clearing it stops the run
    /// at the next trial boundary.
    pub fn run_interruptible(
        &self,
        observer: &mut dyn ExperimentObserver,
        running: Arc<AtomicBool>,
    ) -> Result<RunSummary> {
        let pipeline = StagePipeline::new(&self.config.generate, &self.config.simulate)?;
        let archive = ArchiveRoot::new(self.config.archive_dir.clone());
        archive.ensure_exists()?;

        let mut summary = RunSummary {
            completed: 0,
            failed: Vec::new(),
            interrupted: false,
        };
        info!("starting run: {} trials", self.config.trials);
        for index in 0..self.config.trials {
            if !running.load(Ordering::SeqCst) {
                warn!("run interrupted after {} archived trials", summary.completed);
                summary.interrupted = true;
                break;
            }
            match self.run_trial(&pipeline, &archive, index, observer) {
                Ok(entry) => {
                    summary.completed += 1;
                    observer.trial_completed(summary.completed, self.config.trials);
                    debug!("trial {} archived at {}", index, entry.display());
                }
                Err(e) => {
                    error!("trial {} failed: {}", index, e);
                    match self.config.on_trial_error {
                        TrialErrorPolicy::AbortRun => return Err(e),
                        TrialErrorPolicy::SkipTrial => summary.failed.push((index, e)),
                    }
                }
            }
        }
        info!(
            "run finished: {}/{} trials archived",
            summary.completed, self.config.trials
        );
        Ok(summary)
    }

    /// One full reset→generate→simulate→read→plot→save cycle.
    fn run_trial(
        &self,
        pipeline: &StagePipeline,
        archive: &ArchiveRoot,
        index: usize,
        observer: &mut dyn ExperimentObserver,
    ) -> Result<PathBuf> {
        let scratch = self.config.scratch_dir.as_path();

        observer.phase_changed(index, Phase::Resetting);
        let removed = workspace::reset(scratch)?;
        if removed > 0 {
            debug!("trial {}: cleared {} leftover entries", index, removed);
        }

        pipeline.run(scratch, |stage| {
            observer.phase_changed(
                index,
                match stage {
                    StageKind::Generate => Phase::Generating,
                    StageKind::Simulate => Phase::Simulating,
                },
            )
        })?;

        observer.phase_changed(index, Phase::Reading);
        let artifacts = ArtifactSet::load_from(scratch)?;

        observer.phase_changed(index, Phase::Plotting);
        plot::render_all(&artifacts, scratch)?;

        observer.phase_changed(index, Phase::Saving);
        let entry = archive.commit(scratch, index)?;

        // the plots moved out with the commit; drop the consumed inputs
        // as well so the workspace carries nothing over
        for name in &ARTIFACT_FILES {
            if let Err(e) = fs::remove_file(scratch.join(name)) {
                if e.kind() != ErrorKind::NotFound {
                    warn!("trial {}: failed removing {}: {}", index, name, e);
                }
            }
        }
        Ok(entry)
    }
}
