//! Session verifier with a fixed token table

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;

use tgvault::web::{AuthError, SessionUser, SessionVerifier};

#[derive(Default)]
pub struct MockSessions {
    tokens: HashMap<String, String>,
}

impl MockSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as belonging to `user_id`
    pub fn with_token(mut self, token: &str, user_id: &str) -> Self {
        self.tokens.insert(token.to_string(), user_id.to_string());
        self
    }
}

#[async_trait]
impl SessionVerifier for MockSessions {
    async fn verify(&self, token: &str) -> Result<SessionUser, AuthError> {
        self.tokens
            .get(token)
            .map(|id| SessionUser {
                id: id.clone(),
                email: None,
            })
            .ok_or(AuthError::Rejected)
    }
}
