use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};

use crate::{
    auth::sha256_hex,
    errors::AppError,
    models::{
        revoked_token::RevokedTokenDoc,
        user::{NewUser, UserDoc, UserUpdate},
    },
    store::{retain_until, RevocationLedger, UserStore},
};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    users: Collection<UserDoc>,
    counters: Collection<Document>,
    revoked_tokens: Collection<RevokedTokenDoc>,
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> mongodb::error::Result<Self> {
        let mut opts = ClientOptions::parse(uri).await?;
        opts.app_name = Some("user-gate".to_string());
        let client = Client::with_options(opts)?;
        let db = client.database(db_name);

        let users: Collection<UserDoc> = db.collection("users");
        let counters: Collection<Document> = db.collection("counters");
        let revoked_tokens: Collection<RevokedTokenDoc> = db.collection("revoked_tokens");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(email_index).await?;

        let hash_index = IndexModel::builder()
            .keys(doc! { "token_hash": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        revoked_tokens.create_index(hash_index).await?;

        // server-side pruning; prune_expired covers the reaper's 60s lag
        let ttl_index = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(IndexOptions::builder().expire_after(Duration::ZERO).build())
            .build();
        revoked_tokens.create_index(ttl_index).await?;

        tracing::info!(db = db_name, "mongodb store ready");

        Ok(Self {
            users,
            counters,
            revoked_tokens,
        })
    }

    async fn next_user_id(&self) -> Result<i64, AppError> {
        let counter = self
            .counters
            .find_one_and_update(doc! { "_id": "users" }, doc! { "$inc": { "seq": 1i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::Internal("user id counter missing".into()))?;

        counter
            .get_i64("seq")
            .map_err(|e| AppError::Internal(format!("user id counter: {e}")))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    ) || matches!(err.kind.as_ref(), ErrorKind::Command(e) if e.code == DUPLICATE_KEY)
}

fn to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

#[async_trait]
impl UserStore for MongoStore {
    async fn list(&self) -> Result<Vec<UserDoc>, AppError> {
        let mut cursor = self.users.find(doc! {}).sort(doc! { "_id": 1 }).await?;
        let mut out = Vec::new();
        while cursor.advance().await? {
            out.push(cursor.deserialize_current()?);
        }
        Ok(out)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserDoc>, AppError> {
        Ok(self.users.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>, AppError> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn create(&self, user: NewUser) -> Result<i64, AppError> {
        let id = self.next_user_id().await?;
        let row = UserDoc {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role_id: user.role_id,
            client_id: user.client_id,
            created_at: BsonDateTime::now(),
        };

        match self.users.insert_one(&row).await {
            Ok(_) => Ok(id),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict("user already exists".into())),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, id: i64, update: UserUpdate) -> Result<Option<UserDoc>, AppError> {
        let result = self
            .users
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": {
                    "username": update.username,
                    "email": update.email,
                    "role_id": update.role_id,
                    "client_id": update.client_id,
                }},
            )
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(row) => Ok(row),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict("email already in use".into())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let res = self.users.delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count > 0)
    }
}

#[async_trait]
impl RevocationLedger for MongoStore {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        let result = self
            .revoked_tokens
            .update_one(
                doc! { "token_hash": sha256_hex(token) },
                doc! {
                    "$setOnInsert": { "_id": ObjectId::new(), "revoked_at": BsonDateTime::now() },
                    "$max": { "expires_at": to_bson(retain_until(expires_at)) },
                },
            )
            .upsert(true)
            .await;

        match result {
            Ok(_) => Ok(()),
            // lost an upsert race to a concurrent revoke of the same token
            Err(e) if is_duplicate_key(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        let found = self
            .revoked_tokens
            .find_one(doc! { "token_hash": sha256_hex(token) })
            .await?;
        Ok(found.is_some())
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let res = self
            .revoked_tokens
            .delete_many(doc! { "expires_at": { "$lt": to_bson(now) } })
            .await?;
        Ok(res.deleted_count)
    }
}
