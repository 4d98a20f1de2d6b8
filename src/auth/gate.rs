//! Request admission for protected routes.
//!
//! [`AuthGate::intercept`] holds the whole decision and knows nothing about
//! axum routing; [`require_auth`] is the thin adapter that plugs it into a
//! router with `axum::middleware::from_fn_with_state`.
//!
//! A request is admitted only if its bearer token is absent from the
//! revocation ledger and verifies (signature, algorithm, expiry). The ledger
//! is consulted first, before any claim in the token is trusted.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    auth::jwt::{TokenError, TokenService},
    errors::AppError,
    store::RevocationLedger,
};

/// Verified identity attached to an admitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    /// The bearer token exactly as presented, so handlers can revoke it.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum Rejection {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("token revoked")]
    Revoked,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("revocation lookup failed: {0}")]
    Store(AppError),
}

impl From<Rejection> for AppError {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::Store(e) => e,
            Rejection::MissingCredential | Rejection::Revoked | Rejection::InvalidToken(_) => {
                AppError::Unauthorized
            }
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenService,
    ledger: Arc<dyn RevocationLedger>,
}

impl AuthGate {
    pub fn new(tokens: TokenService, ledger: Arc<dyn RevocationLedger>) -> Self {
        Self { tokens, ledger }
    }

    pub async fn intercept(&self, headers: &HeaderMap) -> Result<AuthUser, Rejection> {
        let Authorization(bearer) = headers
            .typed_get::<Authorization<Bearer>>()
            .ok_or(Rejection::MissingCredential)?;
        let token = bearer.token();
        if token.is_empty() {
            return Err(Rejection::MissingCredential);
        }

        if self.ledger.is_revoked(token).await.map_err(Rejection::Store)? {
            return Err(Rejection::Revoked);
        }

        let claims = self.tokens.verify(token)?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.username.clone(),
            token: token.to_string(),
            expires_at: claims.expires_at(),
        })
    }
}

pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let outcome = gate.intercept(req.headers()).await;
    match outcome {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(rejection) => {
            tracing::debug!(
                reason = %rejection,
                method = %req.method(),
                path = %req.uri().path(),
                "request rejected by auth gate"
            );
            Err(rejection)
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // only present on routes behind require_auth
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::http::{header::AUTHORIZATION, HeaderValue};
    use chrono::Duration;

    use super::*;
    use crate::store::MemoryStore;

    fn setup() -> (AuthGate, TokenService, MemoryStore) {
        let tokens = TokenService::new(b"gate-test-secret", "myapp", Duration::hours(24));
        let store = MemoryStore::new();
        let gate = AuthGate::new(tokens.clone(), Arc::new(store.clone()));
        (gate, tokens, store)
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    struct BrokenLedger;

    #[async_trait]
    impl RevocationLedger for BrokenLedger {
        async fn revoke(&self, _: &str, _: DateTime<Utc>) -> Result<(), AppError> {
            Err(AppError::Db("down".into()))
        }

        async fn is_revoked(&self, _: &str) -> Result<bool, AppError> {
            Err(AppError::Db("down".into()))
        }

        async fn prune_expired(&self, _: DateTime<Utc>) -> Result<u64, AppError> {
            Err(AppError::Db("down".into()))
        }
    }

    #[tokio::test]
    async fn admits_a_fresh_token_and_exposes_identity() {
        let (gate, tokens, _) = setup();
        let token = tokens.issue(5, "erin").unwrap();

        let user = gate.intercept(&bearer(&format!("Bearer {token}"))).await.unwrap();

        assert_eq!(user.user_id, 5);
        assert_eq!(user.username, "erin");
        assert_eq!(user.token, token);
        assert!(user.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn missing_or_non_bearer_header_is_missing_credential() {
        let (gate, _, _) = setup();

        assert!(matches!(
            gate.intercept(&HeaderMap::new()).await,
            Err(Rejection::MissingCredential)
        ));
        assert!(matches!(
            gate.intercept(&bearer("Basic dXNlcjpwYXNz")).await,
            Err(Rejection::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn revoked_token_is_rejected_inside_its_validity_window() {
        let (gate, tokens, store) = setup();
        let token = tokens.issue(5, "erin").unwrap();
        store.revoke(&token, Utc::now() + Duration::hours(24)).await.unwrap();

        assert!(matches!(
            gate.intercept(&bearer(&format!("Bearer {token}"))).await,
            Err(Rejection::Revoked)
        ));
    }

    #[tokio::test]
    async fn ledger_is_checked_before_the_token_is_parsed() {
        let (gate, _, store) = setup();
        store.revoke("garbage", Utc::now() + Duration::hours(1)).await.unwrap();

        assert!(matches!(
            gate.intercept(&bearer("Bearer garbage")).await,
            Err(Rejection::Revoked)
        ));
    }

    #[tokio::test]
    async fn pruning_in_the_expiry_second_keeps_the_token_out() {
        let (gate, tokens, store) = setup();

        // start early in a second so the whole check fits inside it
        while !(50..500).contains(&Utc::now().timestamp_subsec_millis()) {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        // exp == floor(now): the verifier still accepts it for the rest of this second
        let claims = tokens.claims_for(5, "erin", Utc::now() - Duration::hours(24));
        let token = tokens.sign(&claims).unwrap();
        store.revoke(&token, claims.expires_at()).await.unwrap();

        store.prune_expired(Utc::now()).await.unwrap();

        assert!(matches!(
            gate.intercept(&bearer(&format!("Bearer {token}"))).await,
            Err(Rejection::Revoked) | Err(Rejection::InvalidToken(TokenError::Expired))
        ));
    }

    #[tokio::test]
    async fn bad_tokens_carry_the_verification_reason() {
        let (gate, tokens, _) = setup();
        let expired = tokens
            .sign(&tokens.claims_for(5, "erin", Utc::now() - Duration::hours(48)))
            .unwrap();

        assert!(matches!(
            gate.intercept(&bearer(&format!("Bearer {expired}"))).await,
            Err(Rejection::InvalidToken(TokenError::Expired))
        ));
        assert!(matches!(
            gate.intercept(&bearer("Bearer not.a.jwt")).await,
            Err(Rejection::InvalidToken(TokenError::Malformed))
        ));
    }

    #[tokio::test]
    async fn ledger_failure_is_not_an_auth_failure() {
        let tokens = TokenService::new(b"gate-test-secret", "myapp", Duration::hours(24));
        let gate = AuthGate::new(tokens.clone(), Arc::new(BrokenLedger));
        let token = tokens.issue(5, "erin").unwrap();

        let rejection = gate
            .intercept(&bearer(&format!("Bearer {token}")))
            .await
            .unwrap_err();

        assert!(matches!(rejection, Rejection::Store(_)));
        assert!(matches!(AppError::from(rejection), AppError::Db(_)));
    }

    #[test]
    fn auth_rejections_collapse_to_unauthorized() {
        for r in [
            Rejection::MissingCredential,
            Rejection::Revoked,
            Rejection::InvalidToken(TokenError::InvalidSignature),
            Rejection::InvalidToken(TokenError::Expired),
        ] {
            assert!(matches!(AppError::from(r), AppError::Unauthorized));
        }
    }
}
