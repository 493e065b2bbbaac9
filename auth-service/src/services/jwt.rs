use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use thiserror::Error;

use crate::config::JwtConfig;
use crate::models::Role;

/// Session token issuer/verifier.
///
/// Tokens are self-contained HS256 JWTs over a process-wide secret; nothing
/// is stored server-side. The secret is loaded once at startup and an empty
/// secret refuses to start.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Role at issue time. Travels in the token; a role change takes
    /// effect only when the token is reissued.
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Why a token failed verification. Signature and expiry failures are kept
/// apart for diagnostics; both surface to callers as 401.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, AppError> {
        if config.secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must not be empty"
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            token_expiry_hours: config.token_expiry_hours,
        })
    }

    /// Mint a session token for a user with the given role.
    pub fn issue(&self, user_id: &str, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.token_expiry_hours);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode session token: {}", e)))
    }

    /// Verify signature integrity, then expiry. Zero leeway: a token is
    /// rejected the moment its `exp` passes.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, expiry_hours: i64) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            token_expiry_hours: expiry_hours,
        })
        .expect("Failed to create JWT service")
    }

    #[test]
    fn empty_secret_is_fatal() {
        let result = JwtService::new(&JwtConfig {
            secret: String::new(),
            token_expiry_hours: 24,
        });
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let jwt = service("test-secret-0123456789", 24);

        let token = jwt.issue("user_123", Role::Farmer).unwrap();
        assert!(!token.is_empty());

        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.role, Role::Farmer);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let jwt = service("test-secret-0123456789", 24);
        let token = jwt.issue("user_123", Role::Farmer).unwrap();

        // Flip the last signature character to a different value
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        match jwt.verify(&tampered) {
            Err(TokenError::Invalid(_)) => {}
            other => panic!("expected Invalid, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let issuer = service("secret-one-0123456789", 24);
        let verifier = service("secret-two-0123456789", 24);

        let token = issuer.issue("user_123", Role::Admin).unwrap();
        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_distinguished() {
        let jwt = service("test-secret-0123456789", -1);

        let token = jwt.issue("user_123", Role::Farmer).unwrap();
        assert!(matches!(jwt.verify(&token), Err(TokenError::Expired)));
    }
}
