//! Scratch workspace hygiene.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Removes every file directly inside the scratch directory, leaving the
/// directory itself in place. Returns the number of entries removed.
///
/// The workspace contract only ever puts plain files in here; a
/// directory entry cannot be removed this way and fails the reset. No
/// recursive deletion ever happens.
pub fn reset(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Err(Error::WorkspaceReset {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    let entries = fs::read_dir(dir).map_err(|e| Error::WorkspaceReset {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| Error::WorkspaceReset {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::remove_file(entry.path()).map_err(|e| Error::WorkspaceReset {
            path: entry.path(),
            reason: e.to_string(),
        })?;
        removed += 1;
    }
    trace!("reset workspace {}, removed {} entries", dir.display(), removed);
    Ok(removed)
}

#[cfg(test)]
fn scratch_for_test(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("netexp-workspace-{}-{}", std::process::id(), name));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn reset_empties_populated_dir() {
    let dir = scratch_for_test("populated");
    for i in 0..4 {
        fs::write(dir.join(format!("file{}.pkl", i)), b"payload").unwrap();
    }
    assert_eq!(reset(&dir).unwrap(), 4);
    assert!(dir.is_dir());
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn reset_of_empty_dir_is_noop() {
    let dir = scratch_for_test("empty");
    assert_eq!(reset(&dir).unwrap(), 0);
    assert!(dir.is_dir());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn reset_missing_dir_fails() {
    let dir = std::env::temp_dir().join("netexp-workspace-does-not-exist");
    let result = reset(&dir);
    assert!(matches!(result, Err(Error::WorkspaceReset { .. })));
}

#[test]
fn reset_refuses_subdirectories() {
    let dir = scratch_for_test("subdir");
    fs::create_dir(dir.join("nested")).unwrap();
    assert!(matches!(reset(&dir), Err(Error::WorkspaceReset { .. })));
    // the nested directory survives untouched
    assert!(dir.join("nested").is_dir());
    fs::remove_dir_all(&dir).unwrap();
}
