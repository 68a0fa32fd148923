// SPDX-License-Identifier: MIT

//! Login and logout routes.
//!
//! Only the API-key login lives here: an API key requires no external
//! handshake, so resolving the key, establishing the session and minting
//! the token all happen in one request. OAuth-style provider adapters
//! perform their handshake elsewhere and call
//! [`crate::gate::RequestGate::establish`] with the resolved user id,
//! exactly as this handler does.
//!
//! Note that an API key is not a way of adding a new user: keys are only
//! issued to users who already authorized through another method.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::{extract_token, verify_token, SESSION_COOKIE};
use crate::models::{ExternalIdentity, Provider};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login/api", post(login_api))
        .route("/logout", post(logout))
}

#[derive(Deserialize)]
pub struct ApiLoginRequest {
    api_secret_key: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub token: String,
}

/// API-key login: resolve the key to a user, establish authorization,
/// hand back the token both as JSON and as the session cookie.
async fn login_api(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<ApiLoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let identity = ExternalIdentity::Api {
        secret_key: body.api_secret_key,
    };
    let user_id = state.resolver.resolve(&identity).await?;
    let token = state.gate.establish(&user_id, Provider::Api)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Json(LoginResponse { user_id, token })))
}

/// Logout: deauthorize whoever the presented token names and clear the
/// cookie. A missing, forged or stale token still produces a clean
/// logout from the caller's perspective.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, StatusCode) {
    if let Some(token) = extract_token(&jar, &headers) {
        if let Ok(user_id) = verify_token(&token, &state.config.token_signing_key) {
            state
                .gate
                .logout(&user_id, state.cache_invalidation.as_ref());
        }
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), StatusCode::NO_CONTENT)
}
