use super::status;
use super::{ProcRoot, ProcessInspector, ProcessSource};
use crate::constants::{STATUS_GID_KEY, STATUS_GROUPS_KEY, STATUS_UID_KEY};
use crate::errors::{AttestError, Result};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::trace;

/// Reads process state from a procfs mounted at [`ProcRoot`].
#[derive(Clone, Debug, Default)]
pub struct LinuxProcessSource {
    root: ProcRoot,
}

impl LinuxProcessSource {
    pub fn new(root: ProcRoot) -> Self {
        Self { root }
    }
}

impl ProcessSource for LinuxProcessSource {
    fn open(&self, pid: u32) -> Result<Box<dyn ProcessInspector>> {
        let pid_dir = self.root.pid_dir(pid);
        let metadata =
            std::fs::metadata(&pid_dir).map_err(|err| AttestError::from_process_io(pid, err))?;
        if !metadata.is_dir() {
            return Err(AttestError::process_unavailable(
                pid,
                format!("{} is not a process directory", pid_dir.display()),
            ));
        }

        trace!(pid, root = %self.root.path().display(), "opened process");
        Ok(Box::new(LinuxProcessInspector::new(pid, self.root.clone())))
    }
}

/// The status file is read once, on the first query, and uids, gids and groups are all
/// served from that one read. A pid reused mid-inspection can't mix two processes.
#[derive(Clone, Debug)]
pub struct LinuxProcessInspector {
    pid: u32,
    root: ProcRoot,
    status: OnceLock<String>,
}

impl LinuxProcessInspector {
    pub fn new(pid: u32, root: ProcRoot) -> Self {
        Self {
            pid,
            root,
            status: OnceLock::new(),
        }
    }

    fn status(&self) -> Result<&str> {
        if let Some(content) = self.status.get() {
            return Ok(content);
        }
        let content = std::fs::read_to_string(self.root.status_path(self.pid))
            .map_err(|err| AttestError::from_process_io(self.pid, err))?;
        Ok(self.status.get_or_init(|| content))
    }

    fn status_ids(&self, key: &str) -> Result<Vec<u32>> {
        let content = self.status()?;
        status::numeric_ids(content, key).ok_or_else(|| {
            AttestError::process_unavailable(self.pid, format!("status has no valid {key} row"))
        })
    }
}

impl ProcessInspector for LinuxProcessInspector {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn uids(&self) -> Result<Vec<u32>> {
        self.status_ids(STATUS_UID_KEY)
    }

    fn gids(&self) -> Result<Vec<u32>> {
        self.status_ids(STATUS_GID_KEY)
    }

    fn groups(&self) -> Result<Vec<String>> {
        let content = self.status()?;
        Ok(status::supplementary_groups(content, STATUS_GROUPS_KEY))
    }

    fn exe_path(&self) -> Result<String> {
        let target = std::fs::read_link(self.root.exe_path(self.pid))
            .map_err(|err| AttestError::from_process_io(self.pid, err))?;
        Ok(target.to_string_lossy().to_string())
    }

    fn namespaced_exe_path(&self) -> PathBuf {
        self.root.exe_path(self.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const STATUS: &str = "Name:\tworkload\n\
        Uid:\t1000\t1000\t1000\t1000\n\
        Gid:\t1000\t1000\t1000\t1000\n\
        Groups:\t100 101\n";

    fn fake_proc(pid: u32, status: Option<&str>) -> TempDir {
        let root = TempDir::new().unwrap();
        let pid_dir = root.path().join(pid.to_string());
        fs::create_dir_all(&pid_dir).unwrap();
        if let Some(status) = status {
            fs::write(pid_dir.join("status"), status).unwrap();
        }
        root
    }

    fn open(root: &TempDir, pid: u32) -> Result<Box<dyn ProcessInspector>> {
        LinuxProcessSource::new(ProcRoot::new(root.path())).open(pid)
    }

    #[test]
    fn test_reads_ids_and_groups_from_status() {
        let root = fake_proc(42, Some(STATUS));
        let inspector = open(&root, 42).unwrap();

        assert_eq!(inspector.uids().unwrap(), vec![1000, 1000, 1000, 1000]);
        assert_eq!(inspector.gids().unwrap(), vec![1000, 1000, 1000, 1000]);
        assert_eq!(inspector.groups().unwrap(), vec!["100", "101"]);
    }

    #[test]
    fn test_status_is_read_once_per_inspector() {
        let root = fake_proc(42, Some(STATUS));
        let inspector = open(&root, 42).unwrap();
        assert_eq!(inspector.uids().unwrap(), vec![1000, 1000, 1000, 1000]);

        // pid 42 now belongs to a different process
        fs::write(
            root.path().join("42").join("status"),
            "Name:\tother\nUid:\t0\t0\t0\t0\nGid:\t0\t0\t0\t0\nGroups:\t0 4 27\n",
        )
        .unwrap();

        assert_eq!(inspector.gids().unwrap(), vec![1000, 1000, 1000, 1000]);
        assert_eq!(inspector.groups().unwrap(), vec!["100", "101"]);

        let reopened = open(&root, 42).unwrap();
        assert_eq!(reopened.uids().unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_no_groups_row_is_empty() {
        let root = fake_proc(42, Some("Name:\tworkload\nUid:\t0\t0\t0\t0\n"));
        let inspector = open(&root, 42).unwrap();

        assert!(inspector.groups().unwrap().is_empty());
    }

    #[test]
    fn test_missing_status_is_unavailable() {
        let root = fake_proc(42, None);
        let inspector = open(&root, 42).unwrap();

        assert!(matches!(
            inspector.groups(),
            Err(AttestError::ProcessUnavailable { pid: 42, .. })
        ));
        assert!(matches!(
            inspector.uids(),
            Err(AttestError::ProcessUnavailable { pid: 42, .. })
        ));
    }

    #[test]
    fn test_missing_pid_directory_is_unavailable() {
        let root = fake_proc(42, Some(STATUS));
        assert!(matches!(
            open(&root, 43),
            Err(AttestError::ProcessUnavailable { pid: 43, .. })
        ));
    }

    #[test]
    fn test_namespaced_path_uses_root() {
        let root = fake_proc(42, Some(STATUS));
        let inspector = open(&root, 42).unwrap();

        assert_eq!(
            inspector.namespaced_exe_path(),
            root.path().join("42").join("exe")
        );
    }

    #[test]
    fn test_exe_path_follows_link() {
        let root = fake_proc(42, Some(STATUS));
        let binary = root.path().join("workload-bin");
        fs::write(&binary, b"#!/bin/true\n").unwrap();
        std::os::unix::fs::symlink(&binary, root.path().join("42").join("exe")).unwrap();

        let inspector = open(&root, 42).unwrap();
        assert_eq!(
            inspector.exe_path().unwrap(),
            binary.to_string_lossy().to_string()
        );
    }

    #[test]
    fn test_current_process_from_real_procfs() {
        if !std::path::Path::new("/proc/self/status").exists() {
            return;
        }
        let pid = std::process::id();
        let inspector = LinuxProcessSource::default().open(pid).unwrap();

        assert_eq!(inspector.uids().unwrap()[0], nix::unistd::getuid().as_raw());
        assert_eq!(inspector.gids().unwrap()[0], nix::unistd::getgid().as_raw());
        assert!(inspector.groups().is_ok());
        assert!(!inspector.exe_path().unwrap().is_empty());
    }
}
