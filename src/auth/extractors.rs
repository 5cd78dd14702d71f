use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::{
    jwt::{JwtKeys, TokenError},
    session,
};
use crate::error::AuthError;

/// Extracts and validates the session cookie, returning the user ID.
pub struct SessionUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        // Missing, expired and invalid all collapse into the same 401.
        let claims = session::extract_session_token(&parts.headers)
            .ok_or(TokenError::Missing)
            .and_then(|token| keys.verify(&token))
            .map_err(|e| {
                warn!(error = %e, "session token rejected");
                AuthError::Unauthenticated
            })?;

        Ok(SessionUser(claims.sub))
    }
}
