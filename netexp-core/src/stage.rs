//! External stage invocation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::error::{Error, Result};

/// Identifies one of the two pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageKind {
    Generate,
    Simulate,
}

impl StageKind {
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Generate => "generate",
            StageKind::Simulate => "simulate",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The two-stage external pipeline: a generation executable followed by
/// a simulation executable, both run to completion against the scratch
/// workspace.
///
/// The stage processes receive no arguments; their working directory is
/// set to the workspace, which is the whole interface. Executable paths
/// are resolved up front so that setting the child's working directory
/// cannot change which binary runs.
#[derive(Debug, Clone)]
pub struct StagePipeline {
    generate: PathBuf,
    simulate: PathBuf,
}

impl StagePipeline {
    /// Creates a pipeline from the two stage executable paths. Fails if
    /// either executable cannot be resolved.
    pub fn new<P: AsRef<Path>>(generate: P, simulate: P) -> Result<Self> {
        Ok(StagePipeline {
            generate: generate.as_ref().canonicalize()?,
            simulate: simulate.as_ref().canonicalize()?,
        })
    }

    /// Runs a single stage to completion, blocking until the process
    /// terminates. Non-zero exit becomes a `StageFailure`.
    pub fn run_stage(&self, stage: StageKind, workspace: &Path) -> Result<ExitStatus> {
        let executable = match stage {
            StageKind::Generate => &self.generate,
            StageKind::Simulate => &self.simulate,
        };
        info!(
            target: "stage",
            "running `{}` in {}",
            executable.display(),
            workspace.display()
        );
        let status = Command::new(executable)
            .current_dir(workspace)
            .status()
            .map_err(|e| Error::StageSpawn {
                stage,
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(Error::StageFailure {
                stage,
                code: status.code(),
            });
        }
        Ok(status)
    }

    /// Runs generation then simulation, in that order. Simulation
    /// consumes generation's output, so a failed generation stage
    /// short-circuits and the simulation process is never spawned.
    /// The callback fires right before each stage starts.
    pub fn run<F>(&self, workspace: &Path, mut before_stage: F) -> Result<(ExitStatus, ExitStatus)>
    where
        F: FnMut(StageKind),
    {
        before_stage(StageKind::Generate);
        let generated = self.run_stage(StageKind::Generate, workspace)?;
        before_stage(StageKind::Simulate);
        let simulated = self.run_stage(StageKind::Simulate, workspace)?;
        Ok((generated, simulated))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("netexp-stage-{}-{}", std::process::id(), name));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_script(path: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn both_stages_run_in_order() {
        let dir = test_dir("in-order");
        let workspace = dir.join("work");
        fs::create_dir(&workspace).unwrap();
        write_script(&dir.join("generate.sh"), "echo gen > generated.txt");
        write_script(
            &dir.join("simulate.sh"),
            "test -f generated.txt && echo sim > simulated.txt",
        );
        let pipeline =
            StagePipeline::new(dir.join("generate.sh"), dir.join("simulate.sh")).unwrap();

        let mut seen = Vec::new();
        let (generated, simulated) = pipeline
            .run(&workspace, |stage| seen.push(stage))
            .unwrap();

        assert!(generated.success());
        assert!(simulated.success());
        assert_eq!(seen, vec![StageKind::Generate, StageKind::Simulate]);
        assert!(workspace.join("generated.txt").is_file());
        assert!(workspace.join("simulated.txt").is_file());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_generation_skips_simulation() {
        let dir = test_dir("gen-fails");
        let workspace = dir.join("work");
        fs::create_dir(&workspace).unwrap();
        write_script(&dir.join("generate.sh"), "exit 3");
        write_script(&dir.join("simulate.sh"), "echo sim > simulated.txt");
        let pipeline =
            StagePipeline::new(dir.join("generate.sh"), dir.join("simulate.sh")).unwrap();

        let result = pipeline.run(&workspace, |_| {});
        match result {
            Err(Error::StageFailure { stage, code }) => {
                assert_eq!(stage, StageKind::Generate);
                assert_eq!(code, Some(3));
            }
            other => panic!("expected generation stage failure, got {:?}", other),
        }
        assert!(!workspace.join("simulated.txt").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_executable_is_an_error() {
        let dir = test_dir("missing-exe");
        assert!(StagePipeline::new(dir.join("nope"), dir.join("nope")).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
