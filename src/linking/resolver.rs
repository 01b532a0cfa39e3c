use std::sync::Arc;

use crate::storage::{AccountLink, CredentialStore, StoreError};

/// Looks up the Telegram chat a web session user is linked to.
#[derive(Clone)]
pub struct LinkResolver {
    store: Arc<dyn CredentialStore>,
}

impl LinkResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// `Ok(None)` means "never linked"; store failures stay errors.
    pub async fn resolve(&self, session_user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.link(session_user_id).await?.map(|link| link.chat_id))
    }

    /// Full link record, for callers that also want the username
    pub async fn link(&self, session_user_id: &str) -> Result<Option<AccountLink>, StoreError> {
        self.store.get_link(session_user_id).await
    }
}
