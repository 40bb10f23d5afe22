use std::sync::Arc;

use crate::{
    constants::LAST_VIEWED_KEY_PREFIX,
    error::QuoteError,
    models::quotes::Quote,
    storage::{KeyValueStore, KeyValueStoreExt, MemoryStore},
};

/// per-user state that is forgotten when the bot restarts.
#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn KeyValueStore>,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

impl Sessions {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(user: u64) -> String {
        format!("{LAST_VIEWED_KEY_PREFIX}:{user}")
    }

    pub async fn remember(&self, user: u64, quote: &Quote) -> Result<(), QuoteError> {
        self.store.set_json(&Self::key(user), quote).await
    }

    pub async fn last_viewed(&self, user: u64) -> Result<Option<Quote>, QuoteError> {
        self.store.get_json(&Self::key(user)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn last_viewed_is_per_user() {
        let sessions = Sessions::default();
        let quote = Quote::new("a", "Life");

        assert_eq!(sessions.last_viewed(1).await.unwrap(), None);

        sessions.remember(1, &quote).await.unwrap();

        assert_eq!(sessions.last_viewed(1).await.unwrap(), Some(quote));
        assert_eq!(sessions.last_viewed(2).await.unwrap(), None);
    }
}
