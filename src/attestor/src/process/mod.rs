pub mod fallback;
pub mod linux;
pub mod proc_root;
pub mod status;

pub use fallback::{SysinfoProcessInspector, SysinfoProcessSource};
pub use linux::{LinuxProcessInspector, LinuxProcessSource};
pub use proc_root::ProcRoot;

use crate::errors::{AttestError, Result};
use mockall::automock;
use std::path::PathBuf;
use std::sync::Arc;

/// Read access to the state of one live process.
#[automock]
pub trait ProcessInspector: Send + Sync {
    fn pid(&self) -> u32;
    fn uids(&self) -> Result<Vec<u32>>;
    fn gids(&self) -> Result<Vec<u32>>;
    /// Supplementary group ids, in the order the OS reports them.
    fn groups(&self) -> Result<Vec<String>>;
    /// Executable path as reported by the OS. Used for the `path` selector.
    fn exe_path(&self) -> Result<String>;
    /// Path of the executable link under the configured process root. Only used to read
    /// the binary for digesting.
    fn namespaced_exe_path(&self) -> PathBuf;
}

/// Opens inspectors for pids. One implementation is selected per platform at startup.
#[automock]
pub trait ProcessSource: Send + Sync {
    fn open(&self, pid: u32) -> Result<Box<dyn ProcessInspector>>;
}

/// The source for the platform this binary was built for.
#[cfg(target_os = "linux")]
pub fn default_process_source(root: ProcRoot) -> Arc<dyn ProcessSource> {
    Arc::new(LinuxProcessSource::new(root))
}

#[cfg(not(target_os = "linux"))]
pub fn default_process_source(root: ProcRoot) -> Arc<dyn ProcessSource> {
    Arc::new(SysinfoProcessSource::new(root))
}

/// Raw identity of a process gathered in the inspecting stage. Never cached; owned by
/// the run that collected it. Only [`ProcessIdentity::collect`] builds one, so the id
/// sets are never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub pid: u32,
    uids: Vec<u32>,
    gids: Vec<u32>,
    primary_uid: u32,
    primary_gid: u32,
    pub supplementary_group_ids: Vec<String>,
    pub namespaced_exe_path: PathBuf,
}

impl ProcessIdentity {
    /// Reads ids and groups. The executable path is left to the discovery stage.
    pub fn collect(inspector: &dyn ProcessInspector) -> Result<Self> {
        let pid = inspector.pid();

        let uids = inspector.uids()?;
        let primary_uid = *uids
            .first()
            .ok_or_else(|| AttestError::process_unavailable(pid, "no uids reported"))?;
        let gids = inspector.gids()?;
        let primary_gid = *gids
            .first()
            .ok_or_else(|| AttestError::process_unavailable(pid, "no gids reported"))?;
        let supplementary_group_ids = inspector.groups()?;

        Ok(Self {
            pid,
            uids,
            gids,
            primary_uid,
            primary_gid,
            supplementary_group_ids,
            namespaced_exe_path: inspector.namespaced_exe_path(),
        })
    }

    pub fn uids(&self) -> &[u32] {
        &self.uids
    }

    pub fn gids(&self) -> &[u32] {
        &self.gids
    }

    /// The real uid, first of the reported set.
    pub fn primary_uid(&self) -> u32 {
        self.primary_uid
    }

    /// The real gid, first of the reported set.
    pub fn primary_gid(&self) -> u32 {
        self.primary_gid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_inspector() -> MockProcessInspector {
        let mut inspector = MockProcessInspector::new();
        inspector.expect_pid().return_const(42u32);
        inspector.expect_uids().returning(|| Ok(vec![1000, 1000, 1000, 1000]));
        inspector.expect_gids().returning(|| Ok(vec![1001, 1001, 1001, 1001]));
        inspector
            .expect_groups()
            .returning(|| Ok(vec!["100".to_string()]));
        inspector
            .expect_namespaced_exe_path()
            .returning(|| PathBuf::from("/proc/42/exe"));
        inspector
    }

    #[test]
    fn test_collect_never_reads_executable() {
        let mut inspector = mock_inspector();
        inspector.expect_exe_path().never();

        let identity = ProcessIdentity::collect(&inspector).unwrap();
        assert_eq!(identity.primary_uid(), 1000);
        assert_eq!(identity.primary_gid(), 1001);
        assert_eq!(identity.supplementary_group_ids, vec!["100"]);
        assert_eq!(identity.namespaced_exe_path, PathBuf::from("/proc/42/exe"));
    }

    #[test]
    fn test_primary_ids_are_the_real_ids() {
        let mut inspector = MockProcessInspector::new();
        inspector.expect_pid().return_const(42u32);
        inspector.expect_uids().returning(|| Ok(vec![1000, 0, 0, 0]));
        inspector.expect_gids().returning(|| Ok(vec![1001, 0, 0, 0]));
        inspector.expect_groups().returning(|| Ok(vec![]));
        inspector
            .expect_namespaced_exe_path()
            .returning(|| PathBuf::from("/proc/42/exe"));

        let identity = ProcessIdentity::collect(&inspector).unwrap();
        assert_eq!(identity.primary_uid(), 1000);
        assert_eq!(identity.primary_gid(), 1001);
        assert_eq!(identity.uids(), &[1000, 0, 0, 0]);
        assert_eq!(identity.gids(), &[1001, 0, 0, 0]);
    }

    #[test]
    fn test_collect_rejects_empty_gids() {
        let mut inspector = MockProcessInspector::new();
        inspector.expect_pid().return_const(42u32);
        inspector.expect_uids().returning(|| Ok(vec![1000]));
        inspector.expect_gids().returning(|| Ok(vec![]));

        let err = ProcessIdentity::collect(&inspector).unwrap_err();
        assert!(matches!(err, AttestError::ProcessUnavailable { pid: 42, .. }));
    }

    #[test]
    fn test_collect_rejects_empty_uids() {
        let mut inspector = MockProcessInspector::new();
        inspector.expect_pid().return_const(42u32);
        inspector.expect_uids().returning(|| Ok(vec![]));

        let err = ProcessIdentity::collect(&inspector).unwrap_err();
        assert!(matches!(err, AttestError::ProcessUnavailable { pid: 42, .. }));
    }

    #[test]
    fn test_collect_propagates_groups_failure() {
        let mut inspector = MockProcessInspector::new();
        inspector.expect_pid().return_const(42u32);
        inspector.expect_uids().returning(|| Ok(vec![0]));
        inspector.expect_gids().returning(|| Ok(vec![0]));
        inspector
            .expect_groups()
            .returning(|| Err(AttestError::process_unavailable(42, "status vanished")));

        let err = ProcessIdentity::collect(&inspector).unwrap_err();
        assert!(matches!(err, AttestError::ProcessUnavailable { .. }));
    }
}
