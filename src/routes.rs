use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{
    auth::require_auth,
    handlers::{auth as auth_handlers, health::health, users as user_handlers},
    state::AppState,
};

pub fn app_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/users", get(user_handlers::list).post(user_handlers::create))
        .route("/users/delete", post(user_handlers::delete))
        .route("/users/{id}", put(user_handlers::update))
        .route("/me", get(auth_handlers::me))
        .route_layer(middleware::from_fn_with_state(state.gate.clone(), require_auth));

    let api = Router::new()
        .route("/login", post(auth_handlers::login))
        .merge(protected);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}
