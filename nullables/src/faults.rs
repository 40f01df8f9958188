//! Fault injection shared by the nullable collaborators.

use civitas_store::StoreError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Programmable outage and latency switch.
#[derive(Default)]
pub struct Faults {
    unavailable: AtomicBool,
    delay_ms: AtomicU64,
}

impl Faults {
    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Apply the configured latency, then the configured outage.
    pub async fn apply(&self, what: &str) -> Result<(), StoreError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(what.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthy_by_default() {
        let faults = Faults::default();
        assert!(faults.apply("ledger").await.is_ok());
    }

    #[tokio::test]
    async fn outage_reports_unavailable() {
        let faults = Faults::default();
        faults.set_unavailable(true);
        assert!(matches!(
            faults.apply("ledger").await,
            Err(StoreError::Unavailable(w)) if w == "ledger"
        ));
        faults.set_unavailable(false);
        assert!(faults.apply("ledger").await.is_ok());
    }
}
