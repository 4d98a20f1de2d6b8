//! In-process store for development and tests. Nothing survives a restart.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;
use parking_lot::RwLock;

use crate::{
    auth::sha256_hex,
    errors::AppError,
    models::user::{NewUser, UserDoc, UserUpdate},
    store::{retain_until, RevocationLedger, UserStore},
};

#[derive(Default)]
struct UserTable {
    rows: BTreeMap<i64, UserDoc>,
    last_id: i64,
}

impl UserTable {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// Cheap to clone; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<UserTable>>,
    revoked: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoked_len(&self) -> usize {
        self.revoked.read().len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list(&self) -> Result<Vec<UserDoc>, AppError> {
        Ok(self.users.read().rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserDoc>, AppError> {
        Ok(self.users.read().rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>, AppError> {
        Ok(self
            .users
            .read()
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<i64, AppError> {
        let mut table = self.users.write();
        if table.email_taken(&user.email, None) {
            return Err(AppError::Conflict("user already exists".into()));
        }

        table.last_id += 1;
        let id = table.last_id;
        table.rows.insert(
            id,
            UserDoc {
                id,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                role_id: user.role_id,
                client_id: user.client_id,
                created_at: BsonDateTime::now(),
            },
        );
        Ok(id)
    }

    async fn update(&self, id: i64, update: UserUpdate) -> Result<Option<UserDoc>, AppError> {
        let mut table = self.users.write();
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if table.email_taken(&update.email, Some(id)) {
            return Err(AppError::Conflict("email already in use".into()));
        }

        let row = table.rows.get_mut(&id).map(|u| {
            u.username = update.username;
            u.email = update.email;
            u.role_id = update.role_id;
            u.client_id = update.client_id;
            u.clone()
        });
        Ok(row)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.users.write().rows.remove(&id).is_some())
    }
}

#[async_trait]
impl RevocationLedger for MemoryStore {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        let keep_until = retain_until(expires_at);
        self.revoked
            .write()
            .entry(sha256_hex(token))
            .and_modify(|e| *e = (*e).max(keep_until))
            .or_insert(keep_until);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.revoked.read().contains_key(&sha256_hex(token)))
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut revoked = self.revoked.write();
        let before = revoked.len();
        revoked.retain(|_, keep_until| *keep_until >= now);
        Ok((before - revoked.len()) as u64)
    }
}
