// SPDX-License-Identifier: MIT

//! Token-based authentication middleware.
//!
//! The token is a signed, tamper-evident credential over the user id: it
//! proves the user authenticated with us, while the session authority
//! proves they should still be logged in. Verifying integrity needs no
//! server-side lookup; liveness always does.

use crate::error::AppError;
use crate::gate::RequestAuth;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Session token cookie name.
pub const SESSION_COOKIE: &str = "authgate_token";

/// Tokens outlive sessions on purpose: authorization liveness is governed
/// solely by the session authority.
const TOKEN_LIFETIME_SECS: usize = 30 * 24 * 60 * 60;

/// Token claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (internal user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from a gated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Pull the token from the session cookie, falling back to a bearer
/// header.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Middleware that requires a valid token bound to a live session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, request.headers());

    match state.gate.check(token.as_deref())? {
        RequestAuth::Authenticated { user_id } => {
            request.extensions_mut().insert(AuthUser { user_id });
            Ok(next.run(request).await)
        }
        // This route requires a current user.
        RequestAuth::Anonymous => Err(AppError::Unauthorized),
    }
}

/// Mint a signed token for a user session.
pub fn mint_token(user_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify token integrity and extract the claimed user id.
///
/// Success only asserts the token is authentically ours; the session
/// authority decides whether the user is currently authorized.
pub fn verify_token(
    token: &str,
    signing_key: &[u8],
) -> Result<String, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

    #[test]
    fn test_token_roundtrip() {
        let token = mint_token("0123456789abcdef0123456789abcdef", SIGNING_KEY).unwrap();
        let user_id = verify_token(&token, SIGNING_KEY).expect("token should verify");
        assert_eq!(user_id, "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn test_tampered_token_fails() {
        let token = mint_token("user-1", SIGNING_KEY).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        assert!(verify_token(&tampered, SIGNING_KEY).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let token = mint_token("user-1", SIGNING_KEY).unwrap();
        assert!(verify_token(&token, b"another_signing_key_32_bytes!!!!").is_err());
    }

    #[test]
    fn test_expiration_is_future() {
        let token = mint_token("user-1", SIGNING_KEY).unwrap();

        let key = DecodingKey::from_secret(SIGNING_KEY);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let token_data = decode::<Claims>(&token, &key, &validation).unwrap();

        assert!(token_data.claims.exp > token_data.claims.iat);
    }
}
