use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokedTokenDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub token_hash: String, // sha256(token)

    pub revoked_at: BsonDateTime,
    pub expires_at: BsonDateTime, // token exp plus the retention margin; TTL-indexed
}
