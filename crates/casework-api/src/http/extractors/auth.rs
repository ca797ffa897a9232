//! Bearer token authentication extractor.
//!
//! Extracts and verifies user tokens from:
//! - `Authorization: Bearer <token>` header
//! - `X-API-Key: <token>` header
//!
//! Tokens are SHA-256 hashed and looked up in the `users` table.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use casework_types::user::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// Prefix of every issued token.
pub const TOKEN_PREFIX: &str = "cw_";

/// The authenticated caller. Extracting this validates the token.
pub struct Authenticated(pub User);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)?;

        let user = state
            .user_service
            .authenticate(&hash_token(&token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

        tracing::debug!(user_id = %user.id, "authenticated");
        Ok(Authenticated(user))
    }
}

/// Extract the token from request headers.
fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(auth) = headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return non_empty(token);
        }
    }

    if let Some(key) = headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return non_empty(key_str);
    }

    Err(AppError::Unauthorized(
        "Missing token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header."
            .to_string(),
    ))
}

fn non_empty(token: &str) -> Result<String, AppError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Unauthorized".to_string()));
    }
    Ok(token.to_string())
}

/// Compute SHA-256 hash of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// A fresh random token. Only its hash is stored; the plaintext is shown once.
pub fn generate_token() -> String {
    format!(
        "{TOKEN_PREFIX}{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}
