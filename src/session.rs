// SPDX-License-Identifier: MIT

//! Session authority: volatile, self-expiring authorization state.
//!
//! A live entry for a user id *is* the authorization; absence, including
//! absence-by-expiry, is "not authorized". Expiry is passive: expired
//! entries are evicted lazily on access, there is no background sweep.
//! All operations are single-key and atomic through the map's entry API,
//! so a concurrent authorize/deauthorize pair can never leave an ambiguous
//! state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::models::Provider;

/// Session-state misuse errors, surfaced to the calling component.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `authorize` on a user with a live session. Re-login should `touch`.
    #[error("user already has a live session")]
    AlreadyAuthorized,

    /// Operation on a user with no live session; usually a stale or forged
    /// claim.
    #[error("user has no live session")]
    NotAuthorized,
}

#[derive(Debug)]
struct SessionEntry {
    authentication_type: Provider,
    attributes: HashMap<String, String>,
    expires_at: Instant,
}

impl SessionEntry {
    fn new(authentication_type: Provider, expires_at: Instant) -> Self {
        Self {
            authentication_type,
            attributes: HashMap::new(),
            expires_at,
        }
    }

    fn expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Read-only snapshot of a live session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Which provider most recently authorized this session
    pub authentication_type: Provider,
    pub attributes: HashMap<String, String>,
}

/// Volatile mapping from internal user id → session, owning the
/// TTL/renewal policy.
pub struct SessionAuthority {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl SessionAuthority {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Mark `user_id` as authorized via `authentication_type` and start the
    /// expiry countdown at the full window.
    ///
    /// Fails with [`SessionError::AlreadyAuthorized`] if a live session
    /// exists; callers re-establishing a login should `touch` instead.
    pub fn authorize(
        &self,
        user_id: &str,
        authentication_type: Provider,
    ) -> Result<(), SessionError> {
        let now = Instant::now();
        match self.sessions.entry(user_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().expired(now) {
                    return Err(SessionError::AlreadyAuthorized);
                }
                occupied.insert(SessionEntry::new(authentication_type, now + self.ttl));
                Ok(())
            }
            Entry::Vacant(vacant) => {
                vacant.insert(SessionEntry::new(authentication_type, now + self.ttl));
                Ok(())
            }
        }
    }

    /// Whether a non-expired session exists for `user_id`. No side effect
    /// beyond lazy eviction of an expired entry.
    pub fn is_authorized(&self, user_id: &str) -> bool {
        self.evict_expired(user_id);
        self.sessions.contains_key(user_id)
    }

    /// Reset the expiry countdown to the full window.
    pub fn touch(&self, user_id: &str) -> Result<(), SessionError> {
        let now = Instant::now();
        if let Some(mut entry) = self.sessions.get_mut(user_id) {
            if !entry.expired(now) {
                entry.expires_at = now + self.ttl;
                return Ok(());
            }
        }
        self.evict_expired(user_id);
        Err(SessionError::NotAuthorized)
    }

    /// Delete the session.
    ///
    /// Deauthorizing a user without a live session is a caller logic
    /// error, not a silent no-op: it usually means a stale or forged
    /// token, and the caller decides whether to absorb it.
    pub fn deauthorize(&self, user_id: &str) -> Result<(), SessionError> {
        self.evict_expired(user_id);
        match self.sessions.remove(user_id) {
            Some(_) => Ok(()),
            None => Err(SessionError::NotAuthorized),
        }
    }

    /// Remaining time before the session expires, if one is live.
    pub fn remaining(&self, user_id: &str) -> Option<Duration> {
        let now = Instant::now();
        self.sessions.get(user_id).and_then(|entry| {
            if entry.expired(now) {
                None
            } else {
                Some(entry.expires_at - now)
            }
        })
    }

    /// Snapshot of the whole session, or None if not live.
    pub fn session(&self, user_id: &str) -> Option<Session> {
        let now = Instant::now();
        self.sessions.get(user_id).and_then(|entry| {
            if entry.expired(now) {
                None
            } else {
                Some(Session {
                    authentication_type: entry.authentication_type,
                    attributes: entry.attributes.clone(),
                })
            }
        })
    }

    /// Read one session attribute. Probing is cheap: returns None rather
    /// than erroring when the session is not live.
    pub fn get_attribute(&self, user_id: &str, key: &str) -> Option<String> {
        let now = Instant::now();
        self.sessions.get(user_id).and_then(|entry| {
            if entry.expired(now) {
                None
            } else {
                entry.attributes.get(key).cloned()
            }
        })
    }

    /// Set one session attribute.
    pub fn set_attribute(
        &self,
        user_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let now = Instant::now();
        if let Some(mut entry) = self.sessions.get_mut(user_id) {
            if !entry.expired(now) {
                entry.attributes.insert(key.to_string(), value.to_string());
                return Ok(());
            }
        }
        self.evict_expired(user_id);
        Err(SessionError::NotAuthorized)
    }

    /// Delete one session attribute. Deleting a key that was never set is
    /// fine; the session itself must be live.
    pub fn delete_attribute(&self, user_id: &str, key: &str) -> Result<(), SessionError> {
        let now = Instant::now();
        if let Some(mut entry) = self.sessions.get_mut(user_id) {
            if !entry.expired(now) {
                entry.attributes.remove(key);
                return Ok(());
            }
        }
        self.evict_expired(user_id);
        Err(SessionError::NotAuthorized)
    }

    fn evict_expired(&self, user_id: &str) {
        let now = Instant::now();
        self.sessions.remove_if(user_id, |_, entry| entry.expired(now));
    }
}
