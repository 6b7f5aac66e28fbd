use super::{ProcRoot, ProcessInspector, ProcessSource};
use crate::errors::{AttestError, Result};
use std::path::PathBuf;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Process source for platforms without a per-process status pseudo-file. Ids and the
/// executable come from `sysinfo`; supplementary groups are never available.
#[derive(Clone, Debug, Default)]
pub struct SysinfoProcessSource {
    root: ProcRoot,
}

impl SysinfoProcessSource {
    pub fn new(root: ProcRoot) -> Self {
        Self { root }
    }
}

impl ProcessSource for SysinfoProcessSource {
    fn open(&self, pid: u32) -> Result<Box<dyn ProcessInspector>> {
        let sys_pid = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        let process = system
            .process(sys_pid)
            .ok_or_else(|| AttestError::process_unavailable(pid, "process not found"))?;

        let uids = [process.user_id(), process.effective_user_id()]
            .into_iter()
            .flatten()
            .map(|uid| **uid)
            .collect();
        let gids = [process.group_id(), process.effective_group_id()]
            .into_iter()
            .flatten()
            .map(|gid| *gid)
            .collect();

        Ok(Box::new(SysinfoProcessInspector {
            pid,
            uids,
            gids,
            exe: process.exe().map(|path| path.to_path_buf()),
            root: self.root.clone(),
        }))
    }
}

/// Snapshot of the fields `sysinfo` reported when the process was opened.
#[derive(Clone, Debug)]
pub struct SysinfoProcessInspector {
    pid: u32,
    uids: Vec<u32>,
    gids: Vec<u32>,
    exe: Option<PathBuf>,
    root: ProcRoot,
}

impl ProcessInspector for SysinfoProcessInspector {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn uids(&self) -> Result<Vec<u32>> {
        if self.uids.is_empty() {
            return Err(AttestError::process_unavailable(self.pid, "uid not reported"));
        }
        Ok(self.uids.clone())
    }

    fn gids(&self) -> Result<Vec<u32>> {
        if self.gids.is_empty() {
            return Err(AttestError::process_unavailable(self.pid, "gid not reported"));
        }
        Ok(self.gids.clone())
    }

    fn groups(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }

    fn exe_path(&self) -> Result<String> {
        self.exe
            .as_ref()
            .map(|path| path.to_string_lossy().to_string())
            .ok_or_else(|| AttestError::process_unavailable(self.pid, "executable not reported"))
    }

    fn namespaced_exe_path(&self) -> PathBuf {
        self.root.exe_path(self.pid)
    }
}
