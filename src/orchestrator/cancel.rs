//! Cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::MigrateError;

/// Cancellation flag shared between the caller and workers. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(MigrateError::Cancelled)` once cancelled
    pub fn check(&self) -> Result<(), MigrateError> {
        if self.is_cancelled() {
            Err(MigrateError::Cancelled)
        } else {
            Ok(())
        }
    }
}
