//! HS256 bearer tokens: issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::{ClientClaims, TokenValidationError, validate_claims};
use crate::client::ClientRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("malformed or unsigned token: {0}")]
    Invalid(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Verifies a bearer token and yields its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<ClientClaims, JwtError>;
}

/// Mints bearer tokens for authenticated clients.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, client: &ClientRecord, now: DateTime<Utc>) -> Result<String, JwtError>;
}

/// Shared-secret validator.
///
/// The library's own `exp` check is disabled so the claim window is judged
/// against the caller-supplied clock by [`validate_claims`].
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<ClientClaims, JwtError> {
        let data = jsonwebtoken::decode::<ClientClaims>(token, &self.key, &self.validation)
            .map_err(|e| JwtError::Invalid(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

/// Shared-secret issuer with a fixed time-to-live.
pub struct Hs256TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl Hs256TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl TokenIssuer for Hs256TokenIssuer {
    fn issue(&self, client: &ClientRecord, now: DateTime<Utc>) -> Result<String, JwtError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| JwtError::Signing("token expiry overflows".to_string()))?;
        let claims = ClientClaims::new(client.id, client.name.clone(), now, expires_at);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn client() -> ClientRecord {
        ClientRecord::register("acme").unwrap()
    }

    #[test]
    fn issued_token_validates_with_same_secret() {
        let now = Utc::now();
        let issuer = Hs256TokenIssuer::new(SECRET, Duration::hours(1));
        let validator = Hs256JwtValidator::new(SECRET);
        let client = client();

        let token = issuer.issue(&client, now).unwrap();
        let claims = validator.validate(&token, now).unwrap();

        assert_eq!(claims.sub, client.id);
        assert_eq!(claims.name, "acme");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = Hs256TokenIssuer::new(SECRET, Duration::hours(1))
            .issue(&client(), now)
            .unwrap();
        let err = Hs256JwtValidator::new("other-secret")
            .validate(&token, now)
            .unwrap_err();
        assert!(matches!(err, JwtError::Invalid(_)));
    }

    #[test]
    fn expiry_is_checked_against_supplied_clock() {
        let now = Utc::now();
        let token = Hs256TokenIssuer::new(SECRET, Duration::minutes(5))
            .issue(&client(), now)
            .unwrap();
        let err = Hs256JwtValidator::new(SECRET)
            .validate(&token, now + Duration::minutes(6))
            .unwrap_err();
        assert_eq!(err, JwtError::Claims(TokenValidationError::Expired));
    }

    #[test]
    fn unrepresentable_expiry_is_an_error_not_a_panic() {
        let issuer = Hs256TokenIssuer::new(SECRET, Duration::days(100_000_000));
        let err = issuer.issue(&client(), Utc::now()).unwrap_err();
        assert_eq!(err, JwtError::Signing("token expiry overflows".to_string()));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = Hs256JwtValidator::new(SECRET)
            .validate("not.a.jwt", Utc::now())
            .unwrap_err();
        assert!(matches!(err, JwtError::Invalid(_)));
    }
}
