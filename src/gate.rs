// SPDX-License-Identifier: MIT

//! Request authority gate.
//!
//! Decides, for any request, whether a claimed user is currently
//! authorized: token integrity first (delegated to the signed-token
//! primitive), then session liveness. The two failure modes are logged
//! distinctly but surface to callers as one indistinguishable
//! `Unauthorized`, so a probing client learns nothing about why a token
//! was rejected.

use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::auth::{mint_token, verify_token};
use crate::models::Provider;
use crate::session::{SessionAuthority, SessionError};
use crate::util::normalize_user_id;

/// Hook invoked on logout so collaborators can drop per-user derived
/// data. Addressed by normalized user id.
pub trait CacheInvalidation: Send + Sync {
    fn drop_user(&self, user_id: &str);
}

/// Default hook for deployments with nothing to invalidate.
pub struct NoopCacheInvalidation;

impl CacheInvalidation for NoopCacheInvalidation {
    fn drop_user(&self, _user_id: &str) {}
}

/// Outcome of gating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuth {
    /// No token presented; "no current user", not an error.
    Anonymous,
    /// Token integrity verified and the session is live.
    Authenticated { user_id: String },
}

/// Per-request authorization decisions plus login/logout policy.
pub struct RequestGate {
    sessions: Arc<SessionAuthority>,
    signing_key: Vec<u8>,
}

impl RequestGate {
    pub fn new(sessions: Arc<SessionAuthority>, signing_key: Vec<u8>) -> Self {
        Self {
            sessions,
            signing_key,
        }
    }

    /// Gate one request given the token it presented, if any.
    ///
    /// An authorized access also touches the session, so activity keeps a
    /// session alive for the full window.
    pub fn check(&self, token: Option<&str>) -> Result<RequestAuth, AppError> {
        let Some(token) = token else {
            return Ok(RequestAuth::Anonymous);
        };

        let user_id = match verify_token(token, &self.signing_key) {
            Ok(user_id) => user_id,
            Err(err) => {
                tracing::warn!(error = %err, "Rejecting request: token failed integrity check");
                return Err(AppError::Unauthorized);
            }
        };

        match self.sessions.touch(&user_id) {
            Ok(()) => Ok(RequestAuth::Authenticated { user_id }),
            Err(SessionError::NotAuthorized) => {
                // Authentic token, no live session. The caller must clear
                // the token on its side; this is a logical logout.
                tracing::info!(user_id = %user_id, "Rejecting request: session expired");
                Err(AppError::Unauthorized)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Establish authorization after a successful login and mint a token.
    ///
    /// A live session is refreshed rather than re-authorized; the token is
    /// minted only once the session is known to be live, so an issued
    /// token always corresponds to a session that existed at mint time.
    ///
    /// Two logins for the same user may race. `authorize` and `touch` are
    /// each atomic but not together, so the loser of either call retries
    /// with the other until one of them lands; both logins succeed.
    pub fn establish(&self, user_id: &str, authentication_type: Provider) -> Result<String, AppError> {
        loop {
            match self.sessions.authorize(user_id, authentication_type) {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user_id,
                        authentication_type = %authentication_type,
                        "Session established"
                    );
                    break;
                }
                Err(SessionError::AlreadyAuthorized) => match self.sessions.touch(user_id) {
                    Ok(()) => {
                        tracing::debug!(user_id = %user_id, "Login refreshed existing session");
                        break;
                    }
                    // The live session expired between the two calls.
                    Err(SessionError::NotAuthorized) => continue,
                    Err(err) => return Err(err.into()),
                },
                Err(err) => return Err(err.into()),
            }
        }

        mint_token(user_id, &self.signing_key).map_err(AppError::Internal)
    }

    /// Log a user out.
    ///
    /// Logging out without a live session is a silent success from the
    /// caller's perspective. Collaborators are always asked to drop any
    /// cached per-user derived data.
    pub fn logout(&self, user_id: &str, invalidation: &dyn CacheInvalidation) {
        match self.sessions.deauthorize(user_id) {
            Ok(()) => tracing::info!(user_id = %user_id, "Session deauthorized"),
            Err(SessionError::NotAuthorized) => {
                tracing::debug!(user_id = %user_id, "Logout without a live session")
            }
            Err(err) => tracing::warn!(user_id = %user_id, error = %err, "Logout failed"),
        }
        invalidation.drop_user(&normalize_user_id(user_id));
    }
}
