//! Deadline wrapper for collaborator calls.

use crate::GovernanceError;
use civitas_store::StoreError;
use std::future::Future;
use std::time::Duration;

/// Run a collaborator call under `limit`, mapping a missed deadline to
/// [`GovernanceError::Timeout`].
pub(crate) async fn bounded<T, F>(limit: Duration, what: &'static str, call: F) -> Result<T, GovernanceError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(GovernanceError::from),
        Err(_) => Err(GovernanceError::Timeout(what)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_results() {
        let ok = bounded(Duration::from_millis(50), "ledger", async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = bounded(Duration::from_millis(50), "ledger", async {
            Err::<u8, _>(StoreError::Backend("down".into()))
        })
        .await;
        assert!(matches!(err, Err(GovernanceError::Store(StoreError::Backend(_)))));
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let slow = bounded(Duration::from_millis(10), "ledger", async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, StoreError>(())
        })
        .await;
        assert!(matches!(slow, Err(GovernanceError::Timeout("ledger"))));
    }
}
