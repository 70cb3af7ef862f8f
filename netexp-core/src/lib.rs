//! This library implements the experiment harness core.
//!
//! Programming interface is centered around the [`Experiment`] structure,
//! which drives repeated runs of the external two-stage pipeline. Each
//! trial resets the scratch workspace, invokes the `generate` and
//! `simulate` executables in sequence, loads the measurement arrays they
//! leave behind, renders the summary plots and moves them into a uniquely
//! named archive entry. Progress is reported through an injected
//! [`ExperimentObserver`], so the library itself has no terminal
//! dependency.
//!
//! # External stages
//!
//! The two stage executables are treated as black boxes. Their whole
//! contract is: run with the scratch workspace as working directory,
//! write the five artifact files into it, exit zero on success. See the
//! constants below for the agreed filenames.
//!
//! # Using the library
//!
//! ```ignore
//! extern crate netexp_core as netexp;
//! use netexp::{Experiment, ExperimentConfig, NullObserver};
//!
//! pub fn main() {
//!     let experiment = Experiment::new(ExperimentConfig::default());
//!     experiment.run(&mut NullObserver).unwrap();
//! }
//! ```
//!
//! [`Experiment`]: experiment/struct.Experiment.html
//! [`ExperimentObserver`]: experiment/trait.ExperimentObserver.html

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

// reexports
pub use artifact::ArtifactSet;
pub use config::{ExperimentConfig, TrialErrorPolicy};
pub use error::{Error, Result};
pub use experiment::{Experiment, ExperimentObserver, NullObserver, Phase, RunSummary};
pub use stage::StageKind;

pub mod archive;
pub mod artifact;
pub mod config;
pub mod error;
pub mod experiment;
pub mod plot;
pub mod stage;
pub mod workspace;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

/// Experiment manifest file name.
pub const EXPERIMENT_MANIFEST_FILE: &str = "experiment.toml";

/// Number of trials performed when the manifest doesn't say otherwise.
pub const DEFAULT_TRIAL_COUNT: usize = 20;
/// Name of the scratch workspace directory within the experiment tree.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "tmp";
/// Name of the archive root directory within the experiment tree.
pub const DEFAULT_ARCHIVE_DIR_NAME: &str = "out";

/// Broadcast activity artifact file, written by the simulation stage.
pub const BROADCAST_ACTIVITY_FILE: &str = "sc_broadcast_activity.pkl";
/// Dispatch activity artifact file, written by the simulation stage.
pub const DISPATCH_ACTIVITY_FILE: &str = "sc_dispatch_activity.pkl";
/// Discard activity artifact file, written by the simulation stage.
pub const DISCARD_ACTIVITY_FILE: &str = "sc_discard_activity.pkl";
/// Latency artifact file, written by the simulation stage.
pub const LATENCY_FILE: &str = "sc_latency.pkl";
/// Congestion artifact file, written by the simulation stage.
pub const CONGESTION_FILE: &str = "sc_congestion.pkl";

/// All artifact files a successful simulation stage must leave in the
/// scratch workspace.
pub const ARTIFACT_FILES: [&str; 5] = [
    BROADCAST_ACTIVITY_FILE,
    DISPATCH_ACTIVITY_FILE,
    DISCARD_ACTIVITY_FILE,
    LATENCY_FILE,
    CONGESTION_FILE,
];

/// Activity histogram plot file.
pub const ACTIVITY_PLOT_FILE: &str = "activity.png";
/// Latency scatter plot file.
pub const LATENCY_PLOT_FILE: &str = "latency.png";
/// Congestion scatter plot file.
pub const CONGESTION_PLOT_FILE: &str = "congestion.png";

/// All plot files a trial produces, in the order they are archived.
pub const PLOT_FILES: [&str; 3] = [ACTIVITY_PLOT_FILE, LATENCY_PLOT_FILE, CONGESTION_PLOT_FILE];
