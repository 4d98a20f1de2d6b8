use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

use crate::{
    auth::AuthUser,
    dto::auth::{LoginRequest, LoginResponse, MeResponse},
    errors::AppError,
    services::auth_service,
    state::AppState,
};

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload?;
    let token = auth_service::login(&state, req).await?;

    Ok(Json(LoginResponse {
        message: "login successful".to_string(),
        token,
    }))
}

pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id,
        username: user.username,
    })
}
