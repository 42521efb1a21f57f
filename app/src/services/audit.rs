use satchel::{BoxError, Dispose};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Per-request audit scope
///
/// A fresh trail is produced for every handler that asks for one and is
/// closed by the container when the handler returns.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    id: u64,
    started: Instant,
}

impl AuditTrail {
    pub fn begin() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            started: Instant::now(),
        }
    }

    pub fn record(&self, action: &str, detail: &str) {
        tracing::info!(audit = self.id, action, detail, "audit");
    }
}

impl Dispose for AuditTrail {
    fn dispose(&self) -> Result<(), BoxError> {
        tracing::debug!(
            audit = self.id,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "audit trail closed"
        );
        Ok(())
    }
}
