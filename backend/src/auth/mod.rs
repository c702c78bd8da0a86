use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::usecases::errors::EngineError;

#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub exp: usize,
}

/// Secret used to verify user access tokens. Installed as a request extension.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<String>);

impl JwtSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::new(secret.into()))
    }
}

/// Authenticated caller. Only the identity comes from the token; roles are
/// looked up from the user store where they matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<UserClaims, EngineError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<UserClaims>(token, &decoding_key, &validation).map_err(|err| {
        warn!(jwt_error = %err, "auth: token rejected");
        EngineError::Unauthorized("invalid or expired token".to_string())
    })?;

    Ok(token_data.claims)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = EngineError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    EngineError::Unauthorized("missing bearer token".to_string())
                })?;

        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .cloned()
            .ok_or_else(|| {
                EngineError::Internal(anyhow::anyhow!("JwtSecret extension is not installed"))
            })?;

        let claims = validate_jwt(bearer.token(), &secret.0)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| EngineError::Unauthorized("invalid user id in token".to_string()))?;

        Ok(AuthUser { user_id })
    }
}
