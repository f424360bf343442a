use std::{future::Future, sync::Arc};

use tokio::sync::RwLock;

use crate::types::Token;

/// Shared slot holding the token of the authenticated user.
///
/// Cloning the store clones the handle, not the token: every clone observes
/// the same slot. The relay keeps tokens in memory only.
#[derive(Debug, Clone, Default)]
pub struct TokenManager {
    token: Arc<RwLock<Option<Token>>>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Token) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token))),
        }
    }

    pub async fn set(&self, token: Token) {
        *self.token.write().await = Some(token);
    }

    pub async fn current_token(&self) -> Option<Token> {
        self.token.read().await.clone()
    }

    pub async fn is_present(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    /// Replaces `stale` with a refreshed token, running at most one refresh at a time.
    ///
    /// The write lock is held while `refresh` runs. Callers that queued behind
    /// it find a different access token in the slot and get that one back
    /// instead of spending the same refresh token again.
    pub async fn refresh_with<F, Fut, E>(&self, stale: &Token, refresh: F) -> Result<Token, E>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Token, E>>,
    {
        let mut slot = self.token.write().await;
        if let Some(current) = slot.as_ref() {
            if current.access_token != stale.access_token {
                return Ok(current.clone());
            }
        }

        let refreshed = refresh(stale.refresh_token.clone()).await?;
        *slot = Some(refreshed.clone());
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn token(access: &str) -> Token {
        Token {
            access_token: access.to_string(),
            refresh_token: "refresh".to_string(),
            scope: "user-top-read".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            obtained_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn clones_share_the_same_slot() {
        let store = TokenManager::new();
        let other = store.clone();
        assert!(!other.is_present().await);

        store.set(token("first")).await;
        assert_eq!(
            other.current_token().await.map(|t| t.access_token),
            Some("first".to_string())
        );

        other.clear().await;
        assert!(store.current_token().await.is_none());
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_call() {
        let store = TokenManager::with_token(token("stale"));
        let stale = token("stale");
        let calls = AtomicUsize::new(0);

        let refresh = |refresh_token: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                assert_eq!(refresh_token, "refresh");
                tokio::task::yield_now().await;
                Ok::<_, ()>(token("fresh"))
            }
        };

        let (a, b, c) = tokio::join!(
            store.refresh_with(&stale, refresh),
            store.refresh_with(&stale, refresh),
            store.refresh_with(&stale, refresh),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in [a, b, c] {
            assert_eq!(result.unwrap().access_token, "fresh");
        }
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_old_token() {
        let store = TokenManager::with_token(token("stale"));

        let result = store
            .refresh_with(&token("stale"), |_| async { Err::<Token, _>("rejected") })
            .await;

        assert_eq!(result.unwrap_err(), "rejected");
        assert_eq!(
            store.current_token().await.map(|t| t.access_token),
            Some("stale".to_string())
        );
    }

    #[test]
    fn expiry_uses_the_refresh_buffer() {
        let t = token("a");
        assert!(!t.is_expired(t.obtained_at + 3600 - 241));
        assert!(t.is_expired(t.obtained_at + 3600 - 240));
        assert!(t.is_expired(t.obtained_at + 7200));
    }
}
