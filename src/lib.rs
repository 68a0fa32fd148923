// SPDX-License-Identifier: MIT

//! Authgate: identity resolution and session authority.
//!
//! Maps external identities (Google, Facebook, Twitter, BrowserID, or a
//! pre-issued API key) to one internal user id and maintains TTL-bound
//! authorization sessions that downstream services trust.

pub mod config;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod session;
pub mod util;

use std::sync::Arc;

use config::Config;
use db::IdentityStore;
use gate::{CacheInvalidation, RequestGate};
use resolver::IdentityResolver;
use session::SessionAuthority;

/// Shared application state.
///
/// Store handles are constructed once at process start and injected into
/// every component; nothing is lazily created per request.
pub struct AppState {
    pub config: Config,
    pub store: IdentityStore,
    pub sessions: Arc<SessionAuthority>,
    pub resolver: IdentityResolver,
    pub gate: RequestGate,
    pub cache_invalidation: Arc<dyn CacheInvalidation>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: IdentityStore,
        sessions: Arc<SessionAuthority>,
        cache_invalidation: Arc<dyn CacheInvalidation>,
    ) -> Arc<Self> {
        let resolver = IdentityResolver::new(store.clone());
        let gate = RequestGate::new(sessions.clone(), config.token_signing_key.clone());
        Arc::new(Self {
            config,
            store,
            sessions,
            resolver,
            gate,
            cache_invalidation,
        })
    }
}
