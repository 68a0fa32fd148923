// SPDX-License-Identifier: MIT

//! Durable identity store over embedded SQLite.
//!
//! Single source of truth for the (provider, key) → user_id mapping. Each
//! provider gets its own table following one pattern: a unique key column,
//! a unique `user_id` column, profile columns captured at creation, and an
//! index on `user_id` for reverse lookups. The unique indexes are the
//! concurrency truth: `create` either commits a User together with its
//! external identity or fails entirely.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{ExternalIdentity, ProviderKey, User};

/// Role assigned to every user created through the resolver. Roles are a
/// schema-level extension point; no role behavior exists in current scope.
const DEFAULT_ROLE: &str = "regular";

const CREATE_ROLE_TABLE: &str = "CREATE TABLE IF NOT EXISTS role (
    role_id TEXT PRIMARY KEY,
    role_name TEXT NOT NULL,
    privileges TEXT)";

const CREATE_USER_TABLE: &str = "CREATE TABLE IF NOT EXISTS user (
    user_id TEXT PRIMARY KEY,
    role_id TEXT NOT NULL)";

const CREATE_AUTH_GOOGLE_TABLE: &str = "CREATE TABLE IF NOT EXISTS auth_google (
    email TEXT PRIMARY KEY,
    user_id TEXT UNIQUE NOT NULL,
    first_name TEXT,
    last_name TEXT,
    name TEXT,
    locale TEXT)";

const CREATE_AUTH_FACEBOOK_TABLE: &str = "CREATE TABLE IF NOT EXISTS auth_facebook (
    id TEXT PRIMARY KEY,
    user_id TEXT UNIQUE NOT NULL,
    link TEXT NOT NULL,
    access_token TEXT NOT NULL,
    locale TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    name TEXT NOT NULL,
    picture TEXT NOT NULL)";

const CREATE_AUTH_TWITTER_TABLE: &str = "CREATE TABLE IF NOT EXISTS auth_twitter (
    username TEXT PRIMARY KEY,
    user_id TEXT UNIQUE NOT NULL,
    profile_image_url TEXT NOT NULL)";

const CREATE_AUTH_BROWSERID_TABLE: &str = "CREATE TABLE IF NOT EXISTS auth_browserid (
    email TEXT PRIMARY KEY,
    user_id TEXT UNIQUE NOT NULL)";

const CREATE_AUTH_API_TABLE: &str = "CREATE TABLE IF NOT EXISTS auth_api (
    secret_key TEXT PRIMARY KEY,
    user_id TEXT UNIQUE NOT NULL)";

const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ROLE_TABLE,
    CREATE_USER_TABLE,
    CREATE_AUTH_GOOGLE_TABLE,
    CREATE_AUTH_FACEBOOK_TABLE,
    CREATE_AUTH_TWITTER_TABLE,
    CREATE_AUTH_BROWSERID_TABLE,
    CREATE_AUTH_API_TABLE,
    "CREATE INDEX IF NOT EXISTS user_id_on_auth_google ON auth_google(user_id)",
    "CREATE INDEX IF NOT EXISTS user_id_on_auth_facebook ON auth_facebook(user_id)",
    "CREATE INDEX IF NOT EXISTS user_id_on_auth_twitter ON auth_twitter(user_id)",
    "CREATE INDEX IF NOT EXISTS user_id_on_auth_browserid ON auth_browserid(user_id)",
    "CREATE INDEX IF NOT EXISTS user_id_on_auth_api ON auth_api(user_id)",
    "INSERT OR IGNORE INTO role (role_id, role_name, privileges) \
     VALUES ('regular', 'regular', NULL)",
];

const DROP_STATEMENTS: &[&str] = &[
    "DROP TABLE IF EXISTS role",
    "DROP TABLE IF EXISTS user",
    "DROP TABLE IF EXISTS auth_google",
    "DROP TABLE IF EXISTS auth_facebook",
    "DROP TABLE IF EXISTS auth_twitter",
    "DROP TABLE IF EXISTS auth_browserid",
    "DROP TABLE IF EXISTS auth_api",
];

/// Identity store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The (provider, key) pair already exists. Absorbed by the resolver.
    #[error("identity already exists for this provider key")]
    Conflict,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable mapping from (provider, external key) → internal user id.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    pool: SqlitePool,
}

impl IdentityStore {
    /// Open (creating if missing) the identity database at `path`.
    ///
    /// With `reset` the prior contents are discarded and an empty schema is
    /// recreated; this is a controlled-startup operation only. WAL plus a
    /// busy timeout lets concurrent writers serialize, so a losing
    /// create-race surfaces as a unique violation rather than SQLITE_BUSY.
    pub async fn open(path: &Path, reset: bool) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!(path = %path.display(), "Identity store opened");

        let store = Self { pool };
        if reset {
            store.reset().await?;
        } else {
            store.create_schema().await?;
        }
        Ok(store)
    }

    /// Open an in-memory store. A single connection keeps every caller on
    /// the same database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    /// Discard all identity data and recreate the empty schema.
    pub async fn reset(&self) -> Result<(), StoreError> {
        tracing::warn!("Resetting identity store: all prior data discarded");
        for statement in DROP_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        self.create_schema().await
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Look up the internal user id for an external identity key.
    ///
    /// Pure read against the provider table's unique index.
    pub async fn lookup(&self, key: &ProviderKey) -> Result<Option<String>, StoreError> {
        let (sql, value) = match key {
            ProviderKey::Google { email } => {
                ("SELECT user_id FROM auth_google WHERE email = ?", email)
            }
            ProviderKey::Facebook { id } => ("SELECT user_id FROM auth_facebook WHERE id = ?", id),
            ProviderKey::Twitter { username } => (
                "SELECT user_id FROM auth_twitter WHERE username = ?",
                username,
            ),
            ProviderKey::BrowserId { email } => {
                ("SELECT user_id FROM auth_browserid WHERE email = ?", email)
            }
            ProviderKey::Api { secret_key } => (
                "SELECT user_id FROM auth_api WHERE secret_key = ?",
                secret_key,
            ),
        };

        let user_id = sqlx::query_scalar::<_, String>(sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user_id)
    }

    /// Create a new internal user bound to `identity`.
    ///
    /// Generates a fresh 128-bit random user id and persists the User and
    /// its external identity as one transaction; a unique-index violation
    /// on either insert rolls the whole thing back and returns
    /// [`StoreError::Conflict`]. The caller is expected to have looked up
    /// first, but this is the final, atomic guard.
    pub async fn create(&self, identity: &ExternalIdentity) -> Result<User, StoreError> {
        let user_id = Uuid::new_v4().simple().to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO user (user_id, role_id) VALUES (?, ?)")
            .bind(&user_id)
            .bind(DEFAULT_ROLE)
            .execute(&mut *tx)
            .await
            .map_err(map_conflict)?;

        let insert = match identity {
            ExternalIdentity::Google {
                email,
                first_name,
                last_name,
                name,
                locale,
            } => sqlx::query(
                "INSERT INTO auth_google (email, user_id, first_name, last_name, name, locale) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(email)
            .bind(&user_id)
            .bind(first_name.as_deref())
            .bind(last_name.as_deref())
            .bind(name.as_deref())
            .bind(locale.as_deref()),
            ExternalIdentity::Facebook {
                id,
                link,
                access_token,
                locale,
                first_name,
                last_name,
                name,
                picture,
            } => sqlx::query(
                "INSERT INTO auth_facebook \
                 (id, user_id, link, access_token, locale, first_name, last_name, name, picture) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&user_id)
            .bind(link)
            .bind(access_token)
            .bind(locale)
            .bind(first_name)
            .bind(last_name)
            .bind(name)
            .bind(picture),
            ExternalIdentity::Twitter {
                username,
                profile_image_url,
            } => sqlx::query(
                "INSERT INTO auth_twitter (username, user_id, profile_image_url) \
                 VALUES (?, ?, ?)",
            )
            .bind(username)
            .bind(&user_id)
            .bind(profile_image_url),
            ExternalIdentity::BrowserId { email } => {
                sqlx::query("INSERT INTO auth_browserid (email, user_id) VALUES (?, ?)")
                    .bind(email)
                    .bind(&user_id)
            }
            ExternalIdentity::Api { secret_key } => {
                sqlx::query("INSERT INTO auth_api (secret_key, user_id) VALUES (?, ?)")
                    .bind(secret_key)
                    .bind(&user_id)
            }
        };

        insert.execute(&mut *tx).await.map_err(map_conflict)?;
        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            provider = %identity.provider(),
            "Created user with external identity"
        );

        Ok(User {
            user_id,
            role_id: DEFAULT_ROLE.to_string(),
        })
    }

    /// Underlying pool, for direct queries in tests and tooling.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn map_conflict(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google(email: &str) -> ExternalIdentity {
        ExternalIdentity::Google {
            email: email.to_string(),
            first_name: Some("First".to_string()),
            last_name: Some("Last".to_string()),
            name: Some("First Last".to_string()),
            locale: Some("en_US".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_then_lookup() {
        let store = IdentityStore::open_in_memory().await.expect("open store");

        let user = store.create(&google("u@h.com")).await.expect("create");
        assert_eq!(user.user_id.len(), 32);
        assert_eq!(user.role_id, "regular");

        let found = store
            .lookup(&ProviderKey::Google {
                email: "u@h.com".to_string(),
            })
            .await
            .expect("lookup");
        assert_eq!(found, Some(user.user_id));
    }

    #[tokio::test]
    async fn test_lookup_missing_returns_none() {
        let store = IdentityStore::open_in_memory().await.expect("open store");

        let found = store
            .lookup(&ProviderKey::Twitter {
                username: "nobody".to_string(),
            })
            .await
            .expect("lookup");
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts_without_partial_state() {
        let store = IdentityStore::open_in_memory().await.expect("open store");

        store.create(&google("u@h.com")).await.expect("create");
        let err = store.create(&google("u@h.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        // The losing transaction must not leave an orphan user row.
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user")
            .fetch_one(store.pool())
            .await
            .expect("count users");
        let identities: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM auth_google")
            .fetch_one(store.pool())
            .await
            .expect("count identities");
        assert_eq!(users, 1);
        assert_eq!(identities, 1);
    }

    #[tokio::test]
    async fn test_every_provider_shape_round_trips() {
        let store = IdentityStore::open_in_memory().await.expect("open store");

        let identities = vec![
            google("g@h.com"),
            ExternalIdentity::Facebook {
                id: "123".to_string(),
                link: "https://facebook.com/123".to_string(),
                access_token: "fb-token".to_string(),
                locale: "en_US".to_string(),
                first_name: "First".to_string(),
                last_name: "Last".to_string(),
                name: "First Last".to_string(),
                picture: "https://graph.facebook.com/123/picture".to_string(),
            },
            ExternalIdentity::Twitter {
                username: "firstlast".to_string(),
                profile_image_url: "https://twitter.com/firstlast.png".to_string(),
            },
            ExternalIdentity::BrowserId {
                email: "b@h.com".to_string(),
            },
            ExternalIdentity::Api {
                secret_key: "api-key-1".to_string(),
            },
        ];

        for identity in &identities {
            let user = store.create(identity).await.expect("create");
            let found = store.lookup(&identity.key()).await.expect("lookup");
            assert_eq!(found, Some(user.user_id));
        }
    }

    #[tokio::test]
    async fn test_reset_discards_all_data() {
        let store = IdentityStore::open_in_memory().await.expect("open store");

        store.create(&google("u@h.com")).await.expect("create");
        store.reset().await.expect("reset");

        let found = store
            .lookup(&ProviderKey::Google {
                email: "u@h.com".to_string(),
            })
            .await
            .expect("lookup");
        assert_eq!(found, None);
    }
}
