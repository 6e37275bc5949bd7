//! Signed session tokens (HS256, 7-day expiry).

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub sub: i64,
    pub email: String,
    pub name: String,
    /// Expiry (unix seconds)
    pub exp: i64,
}

pub fn create_token(
    user_id: i64,
    email: &str,
    name: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::days(config::TOKEN_EXPIRY_DAYS);

    let claims = TokenClaims {
        sub: user_id,
        email: email.to_owned(),
        name: name.to_owned(),
        exp: expiration.timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Verify a token's signature and expiry; None when either fails.
pub fn verify_token(token: &str, secret: &str) -> Option<TokenClaims> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_roundtrip() {
        let token = create_token(7, "a@b.c", "Alice", SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "a@b.c");
        assert_eq!(claims.name, "Alice");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = create_token(7, "a@b.c", "Alice", SECRET).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(verify_token(&tampered, SECRET).is_none());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(7, "a@b.c", "Alice", SECRET).unwrap();
        assert!(verify_token(&token, "other-secret").is_none());
    }
}
