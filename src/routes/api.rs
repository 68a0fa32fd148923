// SPDX-License-Identifier: MIT

//! Authenticated API routes.

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Provider;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(me))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub authentication_type: Provider,
}

/// Who the gated request belongs to and how they authenticated.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    // The gate touched the session just before this handler ran, so a
    // miss here means it expired in between; treat it like any other
    // not-authorized request.
    let session = state
        .sessions
        .session(&user.user_id)
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(MeResponse {
        user_id: user.user_id,
        authentication_type: session.authentication_type,
    }))
}
