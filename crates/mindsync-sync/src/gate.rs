//! Offline gate
//!
//! In-memory flag consulted first by every orchestrator entry point. While
//! it is set, sync calls fail with `NetworkUnavailable` before touching the
//! local repository or the network.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::error::SyncError;

/// Offline mode switch
#[derive(Debug, Default)]
pub struct OfflineGate {
    offline: AtomicBool,
}

impl OfflineGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engages or releases offline mode. Idempotent.
    pub fn set_offline(&self, offline: bool) {
        let previous = self.offline.swap(offline, Ordering::SeqCst);
        if previous != offline {
            info!(offline, "Offline mode changed");
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Fails with `NetworkUnavailable` while offline
    pub fn check(&self) -> Result<(), SyncError> {
        if self.is_offline() {
            return Err(SyncError::NetworkUnavailable);
        }
        Ok(())
    }
}
