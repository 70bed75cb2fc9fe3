use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::{claims::TokenKind, cookies, jwt::JwtKeys};
use crate::error::AppError;

/// Extracts and validates the access token, returning the user ID.
///
/// The token is taken from `Authorization: Bearer ...`, falling back to the
/// `access_token` cookie set at login.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let token = match parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            Some(auth) => auth
                .strip_prefix("Bearer ")
                .or_else(|| auth.strip_prefix("bearer "))
                .map(str::to_string)
                .ok_or_else(|| {
                    AppError::AuthenticationFailed("Invalid Authorization header".into())
                })?,
            None => cookies::read(&parts.headers, cookies::ACCESS_COOKIE).ok_or_else(|| {
                AppError::AuthenticationFailed(
                    "Authentication credentials were not provided.".into(),
                )
            })?,
        };

        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::AuthenticationFailed("Invalid or expired token".into())
        })?;

        if claims.kind != TokenKind::Access {
            return Err(AppError::AuthenticationFailed("Access token required".into()));
        }

        Ok(AuthUser(claims.sub))
    }
}
