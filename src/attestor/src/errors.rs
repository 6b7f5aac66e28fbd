//! Error taxonomy for a single attestation run.
//!
//! Every variant except [`AttestError::LookupNotFound`] is fatal: the run is aborted and
//! no selectors are returned. Consumers must treat any error as "no identity could be
//! established" and deny by default.

use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupKind {
    User,
    Group,
}

impl Display for LookupKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::User => write!(f, "user"),
            LookupKind::Group => write!(f, "group"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AttestError {
    #[error("process {pid} is unavailable: {reason}")]
    ProcessUnavailable { pid: u32, reason: String },

    #[error("permission denied inspecting process {pid}: {reason}")]
    PermissionDenied { pid: u32, reason: String },

    #[error("no {kind} entry found for id {id}")]
    LookupNotFound { kind: LookupKind, id: String },

    #[error("{kind} lookup failed for id {id}: {reason}")]
    LookupFailed {
        kind: LookupKind,
        id: String,
        reason: String,
    },

    #[error("workload {} exceeds size limit ({size} > {limit})", .path.display())]
    SizeLimitExceeded { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to read workload {} for digesting: {source}", .path.display())]
    DigestReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("attestation deadline exceeded while {stage}")]
    DeadlineExceeded { stage: &'static str },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, AttestError>;

impl AttestError {
    /// Maps an io error raised while reading process state. `EACCES`/`EPERM` become
    /// [`AttestError::PermissionDenied`], everything else means the process is gone or
    /// unreadable.
    pub fn from_process_io(pid: u32, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => AttestError::PermissionDenied {
                pid,
                reason: err.to_string(),
            },
            _ => AttestError::ProcessUnavailable {
                pid,
                reason: err.to_string(),
            },
        }
    }

    pub fn process_unavailable(pid: u32, reason: impl Into<String>) -> Self {
        AttestError::ProcessUnavailable {
            pid,
            reason: reason.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, AttestError::LookupNotFound { .. })
    }
}

impl From<config::ConfigError> for AttestError {
    fn from(err: config::ConfigError) -> Self {
        AttestError::InvalidConfiguration(err.to_string())
    }
}
