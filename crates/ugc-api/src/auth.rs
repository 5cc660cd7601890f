//! Bearer token authentication.
//!
//! The managed auth provider signs access tokens with a per-project HS256
//! secret. Verification happens locally; no network round-trip per request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Decoded access token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email (if available)
    pub email: Option<String>,
    /// Audience
    pub aud: String,
    /// Expiration
    pub exp: i64,
    /// Issued at
    #[serde(default)]
    pub iat: i64,
}

/// Authenticated user extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
        }
    }
}

/// Verifies provider-issued access tokens.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier with an explicit secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["authenticated"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        let secret = std::env::var("AUTH_JWT_SECRET")
            .map_err(|_| ApiError::internal("AUTH_JWT_SECRET not set"))?;
        Ok(Self::new(&secret))
    }

    /// Verify an access token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|_| ApiError::unauthorized("Unauthorized"))?;
        Ok(data.claims)
    }
}

/// Axum extractor for authenticated user.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

        let claims = state.verifier.verify(token)?;

        Ok(AuthUser::from(claims))
    }
}
