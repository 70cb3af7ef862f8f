//! Loading the measurement arrays a trial leaves in the workspace.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_pickle::DeOptions;

use crate::error::{Error, Result};
use crate::{
    BROADCAST_ACTIVITY_FILE, CONGESTION_FILE, DISCARD_ACTIVITY_FILE, DISPATCH_ACTIVITY_FILE,
    LATENCY_FILE,
};

/// The five measurement arrays one trial produces.
///
/// Activity series hold microsecond offsets of individual bridge
/// actions. Latency rows are `(begin_us, latency_us)` pairs, congestion
/// rows are `(time_us, pending_count)` pairs. All five must deserialize
/// before visualization proceeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub broadcast_activity: Vec<i64>,
    pub dispatch_activity: Vec<i64>,
    pub discard_activity: Vec<i64>,
    pub latency: Vec<(i64, i64)>,
    pub congestion: Vec<(i64, i64)>,
}

impl ArtifactSet {
    /// Reads the full artifact set from the workspace. Pure read, the
    /// workspace is not mutated.
    pub fn load_from(dir: &Path) -> Result<Self> {
        Ok(ArtifactSet {
            broadcast_activity: read_artifact(dir, BROADCAST_ACTIVITY_FILE)?,
            dispatch_activity: read_artifact(dir, DISPATCH_ACTIVITY_FILE)?,
            discard_activity: read_artifact(dir, DISCARD_ACTIVITY_FILE)?,
            latency: read_artifact(dir, LATENCY_FILE)?,
            congestion: read_artifact(dir, CONGESTION_FILE)?,
        })
    }
}

/// Deserializes one named pickle artifact from the workspace.
fn read_artifact<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(Error::ArtifactMissing(name.to_string()));
    }
    let file = File::open(&path)?;
    serde_pickle::from_reader(BufReader::new(file), DeOptions::default()).map_err(|e| {
        Error::ArtifactCorrupt {
            name: name.to_string(),
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_pickle::SerOptions;
    use std::fs;
    use std::io::BufWriter;

    fn test_dir(name: &str) -> std::path::PathBuf {
        let dir =
            std::env::temp_dir().join(format!("netexp-artifact-{}-{}", std::process::id(), name));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_pickle<T: Serialize>(path: &Path, value: &T) {
        let mut writer = BufWriter::new(File::create(path).unwrap());
        serde_pickle::to_writer(&mut writer, value, SerOptions::default()).unwrap();
    }

    fn write_full_set(dir: &Path) {
        write_pickle(&dir.join(BROADCAST_ACTIVITY_FILE), &vec![100_i64, 200, 100]);
        write_pickle(&dir.join(DISPATCH_ACTIVITY_FILE), &vec![300_i64]);
        write_pickle(&dir.join(DISCARD_ACTIVITY_FILE), &Vec::<i64>::new());
        write_pickle(&dir.join(LATENCY_FILE), &vec![(0_i64, 5_i64), (1, 7)]);
        write_pickle(&dir.join(CONGESTION_FILE), &vec![(0_i64, 2_i64), (1, 3)]);
    }

    #[test]
    fn load_full_set() {
        let dir = test_dir("full");
        write_full_set(&dir);
        let set = ArtifactSet::load_from(&dir).unwrap();
        assert_eq!(set.broadcast_activity, vec![100, 200, 100]);
        assert_eq!(set.dispatch_activity, vec![300]);
        assert!(set.discard_activity.is_empty());
        assert_eq!(set.latency, vec![(0, 5), (1, 7)]);
        assert_eq!(set.congestion, vec![(0, 2), (1, 3)]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_named_in_error() {
        let dir = test_dir("missing");
        write_full_set(&dir);
        fs::remove_file(dir.join(LATENCY_FILE)).unwrap();
        match ArtifactSet::load_from(&dir) {
            Err(Error::ArtifactMissing(name)) => assert_eq!(name, LATENCY_FILE),
            other => panic!("expected missing artifact, got {:?}", other),
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_file_named_in_error() {
        let dir = test_dir("corrupt");
        write_full_set(&dir);
        fs::write(dir.join(CONGESTION_FILE), b"definitely not a pickle").unwrap();
        match ArtifactSet::load_from(&dir) {
            Err(Error::ArtifactCorrupt { name, .. }) => assert_eq!(name, CONGESTION_FILE),
            other => panic!("expected corrupt artifact, got {:?}", other),
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn loading_does_not_mutate_workspace() {
        let dir = test_dir("pure-read");
        write_full_set(&dir);
        let before = fs::read_dir(&dir).unwrap().count();
        ArtifactSet::load_from(&dir).unwrap();
        assert_eq!(fs::read_dir(&dir).unwrap().count(), before);
        fs::remove_dir_all(&dir).unwrap();
    }
}
