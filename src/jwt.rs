//! Session tokens: HS256 JWTs carried in an httpOnly cookie.
//!
//! The token holds only the user id; the auth guard re-reads the user
//! from the database on every request, so role changes take effect without
//! waiting out the token lifetime.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

/// Name of the session cookie.
pub const COOKIE_NAME: &str = "token";

/// Token lifetime; the cookie max-age matches.
pub const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs a session token for the given user id.
pub fn sign_token(secret: &str, user_id: &str) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

/// Verifies a session token and returns the user id it was issued for.
///
/// Expired and malformed tokens both map to the same 401.
pub fn verify_token(secret: &str, token: &str) -> Result<String> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized(msg::INVALID_TOKEN.to_string()))?;

    Ok(token_data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trip() {
        let token = sign_token(SECRET, "user-123").unwrap();
        let user_id = verify_token(SECRET, &token).unwrap();
        assert_eq!(user_id, "user-123");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = sign_token(SECRET, "user-123").unwrap();
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(verify_token(SECRET, "not.a.jwt").is_err());
    }

    #[test]
    fn tampered_payload_rejected() {
        let token = sign_token(SECRET, "user-123").unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        // Flip a character in the payload segment
        let mut chars: Vec<char> = parts[1].chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        parts[1] = chars.into_iter().collect();
        let tampered = parts.join(".");
        assert!(verify_token(SECRET, &tampered).is_err());
    }
}
