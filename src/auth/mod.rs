use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::policy::Role;

pub mod password;

/// Signed bearer token claims. Stateless: no revocation list, logout is
/// client-side discard, expiry forces re-authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid or expired token: {0}")]
    InvalidOrExpiredToken(String),

    #[error("Token signing failed: {0}")]
    SigningFailure(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// Issues and verifies bearer tokens. Keys are derived from the signing
/// secret once at startup; an empty secret is rejected in `new` so a
/// misconfigured deployment fails before serving, not per-request.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_hours: u64,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::SigningFailure("signing secret is empty".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        })
    }

    /// Issue a signed token for the given identity.
    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
        role: Role,
        customer_id: Option<Uuid>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            name: name.to_string(),
            role,
            customer_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours as i64)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::SigningFailure(e.to_string()))
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidOrExpiredToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-signing-secret", 8).unwrap()
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(TokenService::new("", 8).is_err());
        assert!(TokenService::new("   ", 8).is_err());
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let svc = service();
        let user_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();

        let token = svc
            .issue(user_id, "ana@example.com", "Ana", Role::Customer, Some(customer_id))
            .unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, Role::Customer);
        assert_eq!(claims.customer_id, Some(customer_id));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_fails_verification() {
        let svc = service();
        let token = svc
            .issue(Uuid::new_v4(), "x@example.com", "X", Role::Admin, None)
            .unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('a') { 'b' } else { 'a' });
        assert!(svc.verify(&tampered).is_err());

        let other = TokenService::new("a-different-secret", 8).unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_fails_verification() {
        assert!(service().verify("not-a-token").is_err());
    }

    #[test]
    fn expired_token_fails_verification() {
        let svc = service();
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "old@example.com".to_string(),
            name: "Old".to_string(),
            role: Role::Technician,
            customer_id: None,
            iat: (now - Duration::hours(10)).timestamp(),
            exp: (now - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-signing-secret"),
        )
        .unwrap();

        assert!(svc.verify(&token).is_err());
    }
}
