use crate::{
    auth::AuthUser,
    dto::user::{CreateUserRequest, UpdateUserRequest},
    errors::AppError,
    models::user::{NewUser, UserPublic, UserUpdate},
    password::hash_password_blocking,
    state::AppState,
};

fn normalise(username: &str, email: &str) -> Result<(String, String), AppError> {
    let username = username.trim().to_string();
    let email = email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() {
        return Err(AppError::Validation("username/email required".into()));
    }
    Ok((username, email))
}

pub async fn list(state: &AppState) -> Result<Vec<UserPublic>, AppError> {
    let users = state.users.list().await?;
    Ok(users.into_iter().map(UserPublic::from).collect())
}

pub async fn create(state: &AppState, req: CreateUserRequest) -> Result<i64, AppError> {
    let (username, email) = normalise(&req.username, &req.email)?;
    if req.password.is_empty() {
        return Err(AppError::Validation("password required".into()));
    }

    let password_hash = hash_password_blocking(req.password).await?;

    let id = state
        .users
        .create(NewUser {
            username,
            email,
            password_hash,
            role_id: req.role_id,
            client_id: req.client_id,
        })
        .await?;

    tracing::info!(user_id = id, "user created");
    Ok(id)
}

pub async fn update(state: &AppState, id: i64, req: UpdateUserRequest) -> Result<UserPublic, AppError> {
    let (username, email) = normalise(&req.username, &req.email)?;

    let user = state
        .users
        .update(
            id,
            UserUpdate {
                username,
                email,
                role_id: req.role_id,
                client_id: req.client_id,
            },
        )
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(user.into())
}

/// Removes the user, then revokes the caller's token.
///
/// Revocation is best-effort: the delete has already committed, so a ledger
/// failure is logged and the call still succeeds.
pub async fn delete(state: &AppState, id: i64, caller: &AuthUser) -> Result<UserPublic, AppError> {
    if id == 0 {
        return Err(AppError::Validation("id is required".into()));
    }

    let user = state.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    if !state.users.delete(id).await? {
        // removed concurrently between the lookup and the delete
        return Err(AppError::NotFound);
    }
    tracing::info!(user_id = id, deleted_by = caller.user_id, "user deleted");

    // Only the caller's presented token is revoked. Tokens held by the deleted
    // user stay valid until their own `exp`; there is no per-user token index.
    if let Err(e) = state.revocations.revoke(&caller.token, caller.expires_at).await {
        tracing::warn!(user_id = id, error = %e, "failed to revoke token after user deletion");
    }

    Ok(user.into())
}
