//! services/api/src/adapters/jwt.rs
//!
//! HMAC-SHA256 bearer tokens. The adapter issues tokens for the identity
//! service and validates them for the auth middleware.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use solicare_core::domain::Role;
use solicare_core::ports::{PortError, PortResult, TokenIssuer};
use uuid::Uuid;

/// The claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Role names. Names that are not a known role are kept so the middleware can skip them.
    pub role: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn subject(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidSubject(self.sub.clone()))
    }

    /// The known roles among the claimed names.
    pub fn roles(&self) -> Vec<Role> {
        self.role.iter().filter_map(|r| r.parse().ok()).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("Invalid token subject '{0}'")]
    InvalidSubject(String),
}

#[derive(Clone)]
pub struct JwtAdapter {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration: Duration,
}

impl JwtAdapter {
    pub fn new(secret: &str, expiration_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration: Duration::minutes(expiration_minutes),
        }
    }

    pub fn generate(&self, subject: Uuid, roles: &[Role]) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            role: roles.iter().map(|r| r.as_str().to_string()).collect(),
            iat: now.timestamp(),
            exp: (now + self.expiration).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Checks the signature and expiry and returns the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

impl TokenIssuer for JwtAdapter {
    fn issue(&self, subject: Uuid, roles: &[Role]) -> PortResult<String> {
        self.generate(subject, roles)
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_validate_with_the_same_secret() {
        let jwt = JwtAdapter::new("secret", 60);
        let subject = Uuid::new_v4();
        let token = jwt.issue(subject, &[Role::Senior]).unwrap();

        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.subject().unwrap(), subject);
        assert_eq!(claims.roles(), vec![Role::Senior]);
        assert!(claims.exp > claims.iat);

        let other = JwtAdapter::new("another-secret", 60);
        assert!(matches!(other.validate(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let jwt = JwtAdapter::new("secret", -10);
        let token = jwt.generate(Uuid::new_v4(), &[Role::Member]).unwrap();
        assert!(jwt.validate(&token).is_err());
    }

    #[test]
    fn unknown_role_names_are_skipped() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: vec!["MEMBER".into(), "ROOT".into()],
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.roles(), vec![Role::Member]);
    }
}
