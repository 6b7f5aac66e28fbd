use super::AttestationConfig;
use std::sync::Arc;
use tokio::sync::watch;

/// Process-wide holder of the current [`AttestationConfig`].
///
/// Writers replace the whole snapshot at once; readers clone the current `Arc` and keep
/// using it for the rest of their run, so an in-flight attestation never sees two
/// policies.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    sender: Arc<watch::Sender<Arc<AttestationConfig>>>,
}

impl ConfigStore {
    pub fn new(config: AttestationConfig) -> Self {
        let (sender, _) = watch::channel(Arc::new(config));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Returns the snapshot that is current at the time of the call.
    pub fn snapshot(&self) -> Arc<AttestationConfig> {
        Arc::clone(&self.sender.borrow())
    }

    /// Publishes a new snapshot and returns the one it replaced.
    pub fn replace(&self, config: AttestationConfig) -> Arc<AttestationConfig> {
        let previous = self.sender.send_replace(Arc::new(config));
        tracing::info!(config = ?self.sender.borrow(), "attestation config replaced");
        previous
    }

    /// Receiver notified on every replacement.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AttestationConfig>> {
        self.sender.subscribe()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(AttestationConfig::default())
    }
}
