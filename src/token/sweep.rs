//! Expiry Sweep
//!
//! Background task that periodically drops expired credentials.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::token::storage::CredentialStore;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn a task calling [`CredentialStore::clear_expired`] every `interval`.
/// A zero interval falls back to [`DEFAULT_SWEEP_INTERVAL`]. Abort the
/// returned handle to stop sweeping.
pub fn spawn_expiry_sweep(store: Arc<dyn CredentialStore>, interval: Duration) -> JoinHandle<()> {
    let interval = if interval.is_zero() {
        DEFAULT_SWEEP_INTERVAL
    } else {
        interval
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match store.clear_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "swept expired credentials"),
                Err(e) => warn!(error = %e, "expiry sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::storage::InMemoryCredentialStore;
    use crate::types::{Credential, CredentialKind, ScopeSet};
    use chrono::Utc;

    #[tokio::test]
    async fn test_sweep_removes_expired_credentials() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store
            .put(
                CredentialKind::AccessToken,
                "dead",
                Credential::new("client1", ScopeSet::new(), Utc::now() - chrono::Duration::seconds(1)),
            )
            .await
            .unwrap();
        store
            .put(
                CredentialKind::AccessToken,
                "live",
                Credential::new("client1", ScopeSet::new(), Utc::now() + chrono::Duration::hours(1)),
            )
            .await
            .unwrap();

        let handle = spawn_expiry_sweep(store.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(store.count(CredentialKind::AccessToken).unwrap(), 1);
        assert!(store
            .get(CredentialKind::AccessToken, "live")
            .await
            .unwrap()
            .is_some());
    }
}
