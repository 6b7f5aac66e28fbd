use crate::errors::{AttestError, Result};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied bounds for one attestation run: an optional deadline and a
/// cancellation token. Both end the run with [`AttestError::DeadlineExceeded`].
#[derive(Clone, Debug, Default)]
pub struct AttestContext {
    deadline: Option<Instant>,
    cancellation_token: CancellationToken,
}

impl AttestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn is_done(&self) -> bool {
        self.cancellation_token.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails with `DeadlineExceeded` if the run was cancelled or is past its deadline.
    pub fn check(&self, stage: &'static str) -> Result<()> {
        if self.is_done() {
            return Err(AttestError::DeadlineExceeded { stage });
        }
        Ok(())
    }

    /// Resolves once the run is cancelled or the deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancellation_token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancellation_token.cancelled().await,
        }
    }
}
