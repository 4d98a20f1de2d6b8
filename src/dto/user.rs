use serde::{Deserialize, Serialize};

use crate::models::user::UserPublic;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role_id: i64,
    #[serde(default)]
    pub client_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role_id: i64,
    #[serde(default)]
    pub client_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub message: String,
    pub id: i64,
    pub user: UserPublic,
}
