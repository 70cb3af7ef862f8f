//! Initialize experiment directories from a template.

use std::fs;
use std::path::Path;

use anyhow::{Error, Result};

const MANIFEST_TEMPLATE: &str = r#"# Number of trials to perform.
trials = 20

# Scratch workspace the stage executables run against. Cleared before
# every trial.
scratch_dir = "tmp"

# Archive root; one timestamped entry per successful trial.
archive_dir = "out"

# Stage executables, invoked in order with the scratch workspace as
# their working directory.
generate = "./generate"
simulate = "./simulate"

# What to do with the remaining trials after one fails:
# "abort_run" or "skip_trial".
on_trial_error = "abort_run"
"#;

// Initiate a new experiment directory with a manifest template and the
// default scratch/archive layout
pub fn init_at_path(path_str: &str) -> Result<()> {
    println!("Initiating new experiment at: {}", path_str);

    // test if directory doesn't already exist at path
    let path = Path::new(path_str);
    if path.exists() {
        return Err(Error::msg(format!(
            "Can't initialize experiment, directory already exists ({}). Try another path.",
            path_str
        )));
    }

    fs::create_dir_all(path)?;
    fs::write(path.join(netexp::EXPERIMENT_MANIFEST_FILE), MANIFEST_TEMPLATE)?;
    fs::create_dir(path.join(netexp::DEFAULT_SCRATCH_DIR_NAME))?;
    fs::create_dir(path.join(netexp::DEFAULT_ARCHIVE_DIR_NAME))?;

    Ok(())
}
