//! Bounded, streaming SHA-256 of workload executables.

use crate::constants::DIGEST_CHUNK_SIZE;
use crate::context::AttestContext;
use crate::errors::{AttestError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

const DIGEST_STAGE: &str = "digesting";

/// How `workload_size_limit` is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestPolicy {
    /// `limit == 0`: no `sha256` selector is produced.
    Disabled,
    /// `limit < 0`: hash the whole file.
    Unlimited,
    /// `limit > 0`: files larger than this many bytes are rejected.
    Bounded(u64),
}

impl DigestPolicy {
    pub fn from_limit(limit: i64) -> Self {
        match limit {
            0 => DigestPolicy::Disabled,
            limit if limit < 0 => DigestPolicy::Unlimited,
            limit => DigestPolicy::Bounded(limit.unsigned_abs()),
        }
    }

    /// `None` when digesting is disabled, otherwise the byte cap (`None` inside for
    /// unlimited).
    pub fn max_bytes(&self) -> Option<Option<u64>> {
        match self {
            DigestPolicy::Disabled => None,
            DigestPolicy::Unlimited => Some(None),
            DigestPolicy::Bounded(limit) => Some(Some(*limit)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DigestComputer {
    chunk_size: usize,
}

impl DigestComputer {
    pub fn new() -> Self {
        Self {
            chunk_size: DIGEST_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Lowercase hex SHA-256 of the file at `path`.
    ///
    /// With a `max_bytes` cap the file is rejected if its size exceeds the cap, and again
    /// if more than `max_bytes` are read (the file grew while hashing). The digest is
    /// never computed over a truncated prefix.
    pub async fn sha256(
        &self,
        path: &Path,
        max_bytes: Option<u64>,
        ctx: &AttestContext,
    ) -> Result<String> {
        let read_error = |source| AttestError::DigestReadError {
            path: path.to_path_buf(),
            source,
        };

        let mut file = tokio::select! {
            biased;
            _ = ctx.done() => return Err(AttestError::DeadlineExceeded { stage: DIGEST_STAGE }),
            opened = File::open(path) => opened.map_err(read_error)?,
        };

        if let Some(limit) = max_bytes {
            let size = file.metadata().await.map_err(read_error)?.len();
            if size > limit {
                return Err(AttestError::SizeLimitExceeded {
                    path: path.to_path_buf(),
                    size,
                    limit,
                });
            }
        }

        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total: u64 = 0;

        loop {
            let read = tokio::select! {
                biased;
                _ = ctx.done() => return Err(AttestError::DeadlineExceeded { stage: DIGEST_STAGE }),
                read = file.read(&mut buffer) => read.map_err(read_error)?,
            };
            if read == 0 {
                break;
            }

            total += read as u64;
            if let Some(limit) = max_bytes {
                if total > limit {
                    return Err(AttestError::SizeLimitExceeded {
                        path: path.to_path_buf(),
                        size: total,
                        limit,
                    });
                }
            }
            hasher.update(&buffer[..read]);
        }

        debug!(path = %path.display(), bytes = total, "computed workload digest");
        Ok(hex::encode(hasher.finalize()))
    }
}

impl Default for DigestComputer {
    fn default() -> Self {
        Self::new()
    }
}
