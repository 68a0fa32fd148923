// SPDX-License-Identifier: MIT

//! Identity resolver: the get-or-create protocol.
//!
//! One provider-parameterized path replaces per-provider copies of
//! "look up by provider key, create if absent". The store's unique index
//! is the concurrency truth: when two first logins race, the losing
//! `create` conflicts and the loser converges on the winner's user id.

use crate::db::{IdentityStore, StoreError};
use crate::error::AppError;
use crate::models::ExternalIdentity;

/// Provider-agnostic "get or create user by external identity".
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    store: IdentityStore,
}

impl IdentityResolver {
    pub fn new(store: IdentityStore) -> Self {
        Self { store }
    }

    /// Resolve a verified external identity to the internal user id,
    /// creating the User and its identity record exactly once if none
    /// exists.
    ///
    /// Idempotent and race-safe: all concurrent callers presenting the
    /// same (provider, key) get the same user id. Profile attributes are
    /// captured at creation only and never refreshed on later logins.
    ///
    /// API keys are the exception: a key is only ever minted for an
    /// existing user, so an unknown key is an authorization failure, never
    /// a create.
    pub async fn resolve(&self, identity: &ExternalIdentity) -> Result<String, AppError> {
        let key = identity.key();

        if let Some(user_id) = self.store.lookup(&key).await? {
            return Ok(user_id);
        }

        if let ExternalIdentity::Api { .. } = identity {
            tracing::warn!("API key not recognized");
            return Err(AppError::Unauthorized);
        }

        match self.store.create(identity).await {
            Ok(user) => Ok(user.user_id),
            Err(StoreError::Conflict) => {
                // Lost a first-login race; the winner's mapping is now
                // committed and visible.
                tracing::debug!(provider = %identity.provider(), "create lost race, re-reading");
                self.store
                    .lookup(&key)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(
                            "identity conflicted on create but is absent on re-read"
                        ))
                    })
            }
            Err(err) => Err(err.into()),
        }
    }
}
