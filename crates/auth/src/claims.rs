use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mqgate_core::ClientId;

/// Bearer-token claims (transport-agnostic).
///
/// Timestamps use the registered JWT claim names and are whole seconds since
/// the Unix epoch, so tokens interoperate with any standard JWT library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientClaims {
    /// Subject: the client the token was issued to.
    pub sub: ClientId,

    /// Client display name at issue time.
    pub name: String,

    /// Issued-at (seconds).
    pub iat: i64,

    /// Expiration (seconds).
    pub exp: i64,
}

impl ClientClaims {
    pub fn new(sub: ClientId, name: impl Into<String>, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub,
            name: name.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the claim window.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::jwt`].
pub fn validate_claims(claims: &ClientClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_at(iat: DateTime<Utc>, ttl: Duration) -> ClientClaims {
        ClientClaims::new(ClientId::new(), "acme", iat, iat + ttl)
    }

    #[test]
    fn accepts_token_inside_window() {
        let now = Utc::now();
        let claims = claims_at(now - Duration::minutes(1), Duration::hours(1));
        assert_eq!(validate_claims(&claims, now), Ok(()));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now();
        let claims = claims_at(now - Duration::hours(2), Duration::hours(1));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn rejects_future_token() {
        let now = Utc::now();
        let claims = claims_at(now + Duration::minutes(5), Duration::hours(1));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn rejects_inverted_window() {
        let now = Utc::now();
        let claims = claims_at(now, Duration::zero());
        assert_eq!(
            validate_claims(&claims, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn timestamps_are_whole_seconds() {
        let iat = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let claims = claims_at(iat, Duration::hours(1));
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_003_600);
    }
}
