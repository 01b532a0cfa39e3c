//! Session authentication against Supabase Auth.
//!
//! The web app signs users in with Supabase and sends the access token either
//! as `Authorization: Bearer <token>` (API calls) or as the `access_token`
//! cookie (the Login Widget callback is a plain browser redirect).

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::core::config;

pub const SESSION_COOKIE: &str = "access_token";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing session token")]
    MissingToken,

    #[error("invalid or expired session token")]
    Rejected,

    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

/// Authenticated web app user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<SessionUser, AuthError>;
}

/// Asks Supabase who owns a token: `GET {url}/auth/v1/user`
#[derive(Clone)]
pub struct SupabaseSessions {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseSessions {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config::network::auth_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(config::SUPABASE_URL.as_str(), config::SUPABASE_ANON_KEY.as_str())
    }
}

#[async_trait]
impl SessionVerifier for SupabaseSessions {
    async fn verify(&self, token: &str) -> Result<SessionUser, AuthError> {
        if self.base_url.is_empty() {
            return Err(AuthError::Unavailable("SUPABASE_URL not configured".to_string()));
        }

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<SessionUser>()
                .await
                .map_err(|e| AuthError::Unavailable(format!("unexpected user payload: {}", e))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::Rejected),
            status => Err(AuthError::Unavailable(format!("HTTP {}", status))),
        }
    }
}

/// Bearer token first, then the session cookie.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
        })
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// Resolves the request's session user or fails with `AuthError`.
pub async fn authenticate(verifier: &dyn SessionVerifier, headers: &HeaderMap) -> Result<SessionUser, AuthError> {
    let token = extract_session_token(headers).ok_or(AuthError::MissingToken)?;
    verifier.verify(&token).await
}
