//! Read-through cache for hot session-status and balance reads.
//!
//! The cache is advisory: a failing KV never propagates an error, the read
//! falls through to the store. Writers invalidate before returning.

use crate::kv::KvStore;
use crate::store::SessionStore;
use relay_core::AssetBalance;
use relay_core::Error;
use relay_core::SessionState;
use std::sync::Arc;
use std::time::Duration;

pub struct ReadThroughCache {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl ReadThroughCache {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    fn status_key(session_id: &str) -> String {
        format!("session_status:{session_id}")
    }

    fn balance_key(user_pubkey: &str, asset_id: &str) -> String {
        format!("balance:{user_pubkey}:{asset_id}")
    }

    pub async fn session_status(
        &self,
        store: &SessionStore,
        session_id: &str,
    ) -> Result<Option<SessionState>, Error> {
        let key = Self::status_key(session_id);

        if let Ok(Some(cached)) = self.kv.get(&key).await {
            if let Some(state) = SessionState::parse(&cached) {
                return Ok(Some(state));
            }
        }

        let state = store
            .get_session(session_id)
            .await?
            .map(|session| session.state);

        if let Some(state) = state {
            if let Err(e) = self
                .kv
                .set(&key, state.as_str().to_string(), Some(self.ttl))
                .await
            {
                tracing::debug!("Cache write failed: {e}");
            }
        }

        Ok(state)
    }

    pub async fn balance(
        &self,
        store: &SessionStore,
        user_pubkey: &str,
        asset_id: &str,
    ) -> Result<AssetBalance, Error> {
        let key = Self::balance_key(user_pubkey, asset_id);

        if let Ok(Some(cached)) = self.kv.get(&key).await {
            if let Ok(balance) = serde_json::from_str::<AssetBalance>(&cached) {
                return Ok(balance);
            }
        }

        let balance = store.get_balance(user_pubkey, asset_id).await?;

        if let Ok(serialized) = serde_json::to_string(&balance) {
            if let Err(e) = self.kv.set(&key, serialized, Some(self.ttl)).await {
                tracing::debug!("Cache write failed: {e}");
            }
        }

        Ok(balance)
    }

    /// Drop the cached status for a session. Called before any state write
    /// returns to its caller.
    pub async fn invalidate_session(&self, session_id: &str) {
        if let Err(e) = self.kv.delete(&Self::status_key(session_id)).await {
            tracing::debug!("Cache invalidation failed: {e}");
        }
    }

    /// Drop a cached balance. Called before any balance write returns.
    pub async fn invalidate_balance(&self, user_pubkey: &str, asset_id: &str) {
        if let Err(e) = self
            .kv
            .delete(&Self::balance_key(user_pubkey, asset_id))
            .await
        {
            tracing::debug!("Cache invalidation failed: {e}");
        }
    }
}
