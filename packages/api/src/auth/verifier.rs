//! Bearer token verification for protected routes.
//!
//! [`AuthUser`] is an axum extractor: a handler that takes it only runs once the
//! `Authorization: Bearer <token>` header has been verified. Any failure (no header,
//! another scheme, bad signature, expired token) rejects the request with a 401 before
//! the handler body is reached.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use super::token::TokenKeys;
use crate::error::ApiError;

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

impl AuthUser {
    /// Extract the bearer credential from the request headers.
    fn bearer(parts: &Parts) -> Option<&str> {
        parts
            .headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<TokenKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let token = Self::bearer(parts).ok_or(ApiError::Unauthorized(
            "Missing or invalid authorization header",
        ))?;

        let keys = Arc::<TokenKeys>::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            ApiError::Unauthorized("Invalid token")
        })?;

        let user = AuthUser {
            id: claims.user_id().map_err(|_| ApiError::Unauthorized("Invalid token"))?,
        };
        parts.extensions.insert(user);
        Ok(user)
    }
}
