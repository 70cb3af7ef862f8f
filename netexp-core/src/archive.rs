//! Durable archival of trial output.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Error, Result};
use crate::PLOT_FILES;

/// Timestamp layout inside an archive entry id, second granularity.
pub const ENTRY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// The directory under which one uniquely named entry per successful
/// trial is created. Entries are never mutated or deleted here.
#[derive(Debug, Clone)]
pub struct ArchiveRoot {
    root: PathBuf,
}

impl ArchiveRoot {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        ArchiveRoot { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates the archive root if it isn't there yet. Entry creation
    /// itself stays collision-checked.
    pub fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Composite entry id: wall-clock second plus trial index. The
    /// index disambiguates trials committed within the same second.
    pub fn entry_id(timestamp: &DateTime<Local>, trial_index: usize) -> String {
        format!(
            "{}#{}",
            timestamp.format(ENTRY_TIMESTAMP_FORMAT),
            trial_index
        )
    }

    /// Commits a trial: creates the entry directory and moves the three
    /// plot files out of the workspace into it.
    pub fn commit(&self, workspace: &Path, trial_index: usize) -> Result<PathBuf> {
        self.commit_with_id(workspace, &Self::entry_id(&Local::now(), trial_index))
    }

    /// Commit under an explicit entry id. An existing entry of the same
    /// name is a collision, never overwritten or merged into. A move
    /// failing partway leaves the files moved so far in place for
    /// diagnosis; there is no rollback.
    pub fn commit_with_id(&self, workspace: &Path, id: &str) -> Result<PathBuf> {
        let entry = self.root.join(id);
        if let Err(e) = fs::create_dir(&entry) {
            return Err(match e.kind() {
                ErrorKind::AlreadyExists => Error::ArchiveCollision(id.to_string()),
                _ => e.into(),
            });
        }
        for name in &PLOT_FILES {
            let src = workspace.join(name);
            let dst = entry.join(name);
            fs::rename(&src, &dst).map_err(|e| {
                Error::ArchivalFailure(format!(
                    "failed moving {} into {}: {}",
                    name,
                    entry.display(),
                    e
                ))
            })?;
        }
        info!("archived trial output at {}", entry.display());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("netexp-archive-{}-{}", std::process::id(), name));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_plot_files(workspace: &Path) {
        for name in &PLOT_FILES {
            fs::write(workspace.join(name), name.as_bytes()).unwrap();
        }
    }

    #[test]
    fn commit_moves_all_plot_files() {
        let dir = test_dir("commit");
        let workspace = dir.join("work");
        fs::create_dir(&workspace).unwrap();
        write_plot_files(&workspace);
        let archive = ArchiveRoot::new(dir.join("out"));
        archive.ensure_exists().unwrap();

        let entry = archive.commit_with_id(&workspace, "2026-01-01-00-00-00#0").unwrap();

        for name in &PLOT_FILES {
            assert!(entry.join(name).is_file());
            assert!(!workspace.join(name).exists());
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn colliding_id_rejected_and_first_entry_untouched() {
        let dir = test_dir("collision");
        let workspace = dir.join("work");
        fs::create_dir(&workspace).unwrap();
        write_plot_files(&workspace);
        let archive = ArchiveRoot::new(dir.join("out"));
        archive.ensure_exists().unwrap();

        let id = "2026-01-01-00-00-00#7";
        let entry = archive.commit_with_id(&workspace, id).unwrap();
        write_plot_files(&workspace);
        match archive.commit_with_id(&workspace, id) {
            Err(Error::ArchiveCollision(collided)) => assert_eq!(collided, id),
            other => panic!("expected archive collision, got {:?}", other),
        }
        // first commit still holds its three files
        assert_eq!(fs::read_dir(&entry).unwrap().count(), 3);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn partial_move_reported_without_rollback() {
        let dir = test_dir("partial");
        let workspace = dir.join("work");
        fs::create_dir(&workspace).unwrap();
        write_plot_files(&workspace);
        // third plot file goes missing before the commit
        fs::remove_file(workspace.join(PLOT_FILES[2])).unwrap();
        let archive = ArchiveRoot::new(dir.join("out"));
        archive.ensure_exists().unwrap();

        let result = archive.commit_with_id(&workspace, "2026-01-01-00-00-00#1");
        assert!(matches!(result, Err(Error::ArchivalFailure(_))));
        // the first two files stay where the failure left them
        let entry = dir.join("out").join("2026-01-01-00-00-00#1");
        assert!(entry.join(PLOT_FILES[0]).is_file());
        assert!(entry.join(PLOT_FILES[1]).is_file());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn entry_id_layout() {
        use chrono::TimeZone;
        let timestamp = Local.ymd(2026, 8, 6).and_hms(13, 5, 59);
        assert_eq!(
            ArchiveRoot::entry_id(&timestamp, 4),
            "2026-08-06-13-05-59#4"
        );
    }
}
