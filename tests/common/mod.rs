// SPDX-License-Identifier: MIT

use authgate::config::Config;
use authgate::db::IdentityStore;
use authgate::gate::NoopCacheInvalidation;
use authgate::routes::create_router;
use authgate::session::SessionAuthority;
use authgate::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Create a fresh on-disk test database. A file-backed store exercises
/// the same WAL/locking behavior as production, which matters for the
/// concurrent-create tests.
#[allow(dead_code)]
pub async fn test_store() -> IdentityStore {
    let path = std::env::temp_dir().join(format!(
        "authgate-test-{}.db",
        uuid::Uuid::new_v4().simple()
    ));
    IdentityStore::open(&path, true)
        .await
        .expect("Failed to open test identity store")
}

/// Create a test app with the default one-hour session window.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_ttl(Duration::from_secs(3600)).await
}

/// Create a test app with a custom session window.
#[allow(dead_code)]
pub async fn create_test_app_with_ttl(ttl: Duration) -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let store = test_store().await;
    let sessions = Arc::new(SessionAuthority::new(ttl));
    let state = AppState::new(config, store, sessions, Arc::new(NoopCacheInvalidation));
    (create_router(state.clone()), state)
}
