use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id")]
    pub id: i64,

    pub username: String,
    pub email: String,

    pub password_hash: String,

    pub role_id: i64,
    pub client_id: i64,

    pub created_at: BsonDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i64,
    pub client_id: i64,
}

#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub role_id: i64,
    pub client_id: i64,
}

/// What leaves the service. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role_id: i64,
    pub client_id: i64,
    pub created_at: String,
}

impl From<UserDoc> for UserPublic {
    fn from(u: UserDoc) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role_id: u.role_id,
            client_id: u.client_id,
            created_at: bson_to_rfc3339(u.created_at),
        }
    }
}

fn bson_to_rfc3339(dt: BsonDateTime) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(dt.timestamp_millis())
        .unwrap_or_default()
        .to_rfc3339()
}
