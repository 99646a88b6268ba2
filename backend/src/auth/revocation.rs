use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Token ids that were logged out before they expired.
///
/// Entries are kept only until the token would have expired anyway; expired
/// ids are pruned on every revocation.
#[derive(Default)]
pub struct RevocationList {
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp > now);
        if expires_at > now {
            revoked.insert(token_id.to_string(), expires_at);
        }
    }

    pub async fn is_revoked(&self, token_id: &str) -> bool {
        self.revoked
            .read()
            .await
            .get(token_id)
            .is_some_and(|exp| *exp > Utc::now())
    }

    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }
}
