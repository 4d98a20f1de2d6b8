use crate::{
    dto::auth::LoginRequest,
    errors::AppError,
    password::{verify_password_blocking, DECOY_HASH},
    state::AppState,
};

/// Checks the credentials and issues a bearer token.
///
/// Unknown email and wrong password both come back as
/// [`AppError::Unauthorized`]; callers cannot tell them apart.
pub async fn login(state: &AppState, req: LoginRequest) -> Result<String, AppError> {
    let email = req.email.trim().to_lowercase();

    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("email/password required".into()));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        // same argon2 work as a wrong password, so timing does not reveal the account
        verify_password_blocking(req.password, DECOY_HASH.to_string()).await?;
        tracing::debug!("login failed: unknown email");
        return Err(AppError::Unauthorized);
    };

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = user.id, "login failed: wrong password");
        return Err(AppError::Unauthorized);
    }

    let token = state.tokens.issue(user.id, &user.username)?;
    tracing::info!(user_id = user.id, "login succeeded");
    Ok(token)
}
