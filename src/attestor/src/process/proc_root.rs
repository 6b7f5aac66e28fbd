use crate::constants::{DEFAULT_PROC_ROOT, EXE_LINK, PROC_ROOT_ENV_VAR, STATUS_FILE};
use crate::errors::{AttestError, Result};
use std::path::{Path, PathBuf};

/// Root of the process-information filesystem the agent reads from.
///
/// Defaults to `/proc`. Deployments where the agent runs in a different mount namespace
/// than its workloads mount the host's procfs elsewhere and point `HOST_PROC` at it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcRoot(PathBuf);

impl ProcRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn from_env() -> Result<Self> {
        Self::from_override(std::env::var(PROC_ROOT_ENV_VAR).ok())
    }

    /// An unset or empty override selects the default root.
    pub fn from_override(value: Option<String>) -> Result<Self> {
        match value.filter(|value| !value.trim().is_empty()) {
            None => Ok(Self::default()),
            Some(value) => {
                let path = PathBuf::from(value.trim());
                if !path.is_absolute() {
                    return Err(AttestError::InvalidConfiguration(format!(
                        "{PROC_ROOT_ENV_VAR} must be an absolute path, got {}",
                        path.display()
                    )));
                }
                Ok(Self(path))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn pid_dir(&self, pid: u32) -> PathBuf {
        self.0.join(pid.to_string())
    }

    pub fn pid_entry(&self, pid: u32, entry: &str) -> PathBuf {
        self.pid_dir(pid).join(entry)
    }

    pub fn status_path(&self, pid: u32) -> PathBuf {
        self.pid_entry(pid, STATUS_FILE)
    }

    pub fn exe_path(&self, pid: u32) -> PathBuf {
        self.pid_entry(pid, EXE_LINK)
    }
}

impl Default for ProcRoot {
    fn default() -> Self {
        Self(PathBuf::from(DEFAULT_PROC_ROOT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_root_exe_path() {
        assert_eq!(
            ProcRoot::default().exe_path(42),
            PathBuf::from("/proc/42/exe")
        );
    }

    #[test]
    fn test_override_exe_path() {
        let root = ProcRoot::from_override(Some("/host/proc".to_string())).unwrap();
        assert_eq!(root.exe_path(42), PathBuf::from("/host/proc/42/exe"));
        assert_eq!(root.status_path(42), PathBuf::from("/host/proc/42/status"));
    }

    #[test]
    fn test_empty_override_uses_default() {
        let root = ProcRoot::from_override(Some("  ".to_string())).unwrap();
        assert_eq!(root, ProcRoot::default());
    }

    #[test]
    fn test_relative_override_is_rejected() {
        let err = ProcRoot::from_override(Some("host/proc".to_string())).unwrap_err();
        assert!(matches!(err, AttestError::InvalidConfiguration(_)));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_host_proc() {
        std::env::set_var(PROC_ROOT_ENV_VAR, "/mnt/host-proc");
        let root = ProcRoot::from_env();
        std::env::remove_var(PROC_ROOT_ENV_VAR);

        assert_eq!(
            root.unwrap().exe_path(42),
            PathBuf::from("/mnt/host-proc/42/exe")
        );
    }

    #[test]
    #[serial]
    fn test_from_env_without_override() {
        std::env::remove_var(PROC_ROOT_ENV_VAR);
        assert_eq!(ProcRoot::from_env().unwrap(), ProcRoot::default());
    }
}
