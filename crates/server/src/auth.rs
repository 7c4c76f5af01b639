//! Session gate for the HTTP API.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use docchat_core::config::AuthConfig;
use docchat_core::AppError;
use std::collections::HashSet;

/// Decides whether a request belongs to an authenticated session.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, headers: &HeaderMap) -> bool;
}

/// Accepts `Authorization: Bearer <token>` for a fixed set of tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashSet<String>,
    disabled: bool,
}

impl StaticTokenVerifier {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().filter(|t| !t.is_empty()).collect(),
            disabled: false,
        }
    }

    /// Authorize every request.
    pub fn allow_all() -> Self {
        Self {
            tokens: HashSet::new(),
            disabled: true,
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        if auth.disabled {
            tracing::warn!("Authorization disabled; every request is accepted");
            return Self::allow_all();
        }
        Self::new(auth.tokens.iter().cloned())
    }
}

impl SessionVerifier for StaticTokenVerifier {
    fn verify(&self, headers: &HeaderMap) -> bool {
        if self.disabled {
            return true;
        }

        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| self.tokens.contains(token.trim()))
            .unwrap_or(false)
    }
}

/// Extractor that rejects the request with 401 unless the session verifies.
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

impl FromRequestParts<AppState> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if state.verifier.verify(&parts.headers) {
            Ok(Authorized)
        } else {
            Err(ApiError(AppError::Unauthorized))
        }
    }
}
