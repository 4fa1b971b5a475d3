//! Bearer-token authentication.
//!
//! Tokens are issued by the login service and signed with a shared HS256
//! secret. This service only validates them and turns the subject into the
//! caller's user id. Ids are opaque strings (login-service ObjectIds, UUIDs).

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// JWT claims issued by the login service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// User id as the login service signs it. Used when `sub` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Expiration timestamp (Unix).
    pub exp: i64,
    /// Issued at timestamp (Unix).
    #[serde(default)]
    pub iat: Option<i64>,
}

pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn with_hs256(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 30; // clock skew tolerance, seconds

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Validates the token signature and expiry and returns the caller's user id.
    pub fn validate(&self, token: &str) -> Result<String, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("token expired".to_string()),
                _ => AppError::Unauthorized(format!("invalid token: {e}")),
            }
        })?;

        data.claims
            .user_id()
            .map(str::to_string)
            .ok_or_else(|| AppError::Unauthorized("token carries no user id".to_string()))
    }
}

impl Claims {
    /// `sub` when present and non-blank, otherwise `id`.
    pub fn user_id(&self) -> Option<&str> {
        [self.sub.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|id| !id.is_empty())
    }
}

/// The authenticated caller. Extracting it rejects the request with 401 when
/// the `Authorization: Bearer` header is missing or invalid.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let result = bearer_token(parts).and_then(|token| state.jwt.validate(token));
        match result {
            Ok(id) => Ok(AuthUser { id }),
            Err(e) => {
                warn!(path = %parts.uri.path(), "Rejected request: {e}");
                Err(e)
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("malformed authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("expected a Bearer token".to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    pub(crate) const TEST_SECRET: &[u8] = b"test-secret-key-at-least-32-bytes";

    pub(crate) fn token_for(user_id: &str, secret: &[u8], exp_offset_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        sign(
            &Claims {
                sub: Some(user_id.to_string()),
                id: None,
                exp: now + exp_offset_secs,
                iat: Some(now),
            },
            secret,
        )
    }

    fn sign<T: Serialize>(claims: &T, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_valid_token_yields_user_id() {
        let user = Uuid::new_v4().to_string();
        let validator = JwtValidator::with_hs256(TEST_SECRET);
        let token = token_for(&user, TEST_SECRET, 3600);
        assert_eq!(validator.validate(&token).unwrap(), user);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let validator = JwtValidator::with_hs256(TEST_SECRET);
        let token = token_for("65a1f0c2e4b0a1b2c3d4e5f6", TEST_SECRET, -3600);
        let err = validator.validate(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m.contains("expired")));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let validator = JwtValidator::with_hs256(b"another-secret-key-of-32-bytes!!");
        let token = token_for("65a1f0c2e4b0a1b2c3d4e5f6", TEST_SECRET, 3600);
        assert!(matches!(
            validator.validate(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_object_id_in_id_claim_is_accepted() {
        let validator = JwtValidator::with_hs256(TEST_SECRET);
        let token = sign(
            &serde_json::json!({ "id": "65a1f0c2e4b0a1b2c3d4e5f6", "exp": in_an_hour() }),
            TEST_SECRET,
        );
        assert_eq!(validator.validate(&token).unwrap(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn test_sub_wins_when_both_claims_are_present() {
        let validator = JwtValidator::with_hs256(TEST_SECRET);
        let token = sign(
            &serde_json::json!({
                "sub": "65a1f0c2e4b0a1b2c3d4e5f6",
                "id": "ignored",
                "exp": in_an_hour(),
            }),
            TEST_SECRET,
        );
        assert_eq!(validator.validate(&token).unwrap(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn test_blank_sub_falls_back_to_id() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"  ","id":"65a1f0c2e4b0a1b2c3d4e5f6","exp":1}"#)
                .unwrap();
        assert_eq!(claims.user_id(), Some("65a1f0c2e4b0a1b2c3d4e5f6"));
    }

    #[test]
    fn test_token_without_user_id_is_rejected() {
        let validator = JwtValidator::with_hs256(TEST_SECRET);
        let token = sign(&serde_json::json!({ "exp": in_an_hour() }), TEST_SECRET);
        assert!(matches!(
            validator.validate(&token),
            Err(AppError::Unauthorized(ref m)) if m.contains("no user id")
        ));
    }
}
