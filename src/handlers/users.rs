use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    auth::AuthUser,
    dto::user::{
        CreateUserRequest, CreateUserResponse, DeleteUserRequest, DeleteUserResponse,
        UpdateUserRequest,
    },
    errors::AppError,
    models::user::UserPublic,
    services::user_service,
    state::AppState,
};

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserPublic>>, AppError> {
    Ok(Json(user_service::list(&state).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUserResponse>), AppError> {
    let Json(req) = payload?;
    let id = user_service::create(&state, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "user created".to_string(),
            id,
        }),
    ))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserPublic>, AppError> {
    let Json(req) = payload?;
    Ok(Json(user_service::update(&state, id, req).await?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    payload: Result<Json<DeleteUserRequest>, JsonRejection>,
) -> Result<Json<DeleteUserResponse>, AppError> {
    let Json(req) = payload?;
    let user = user_service::delete(&state, req.id, &caller).await?;

    Ok(Json(DeleteUserResponse {
        message: "user deleted".to_string(),
        id: req.id,
        user,
    }))
}
