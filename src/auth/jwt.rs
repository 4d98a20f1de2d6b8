use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::{config::Config, errors::AppError};

/// Only the HMAC family is accepted on verify.
pub const HMAC_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique per issue, so two logins in the same second never share a token.
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

/// Why a presented token was refused. Callers outside this crate only ever
/// see a generic 401; the variant is for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::UnsupportedAlgorithm
            }
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies HMAC-signed bearer tokens.
///
/// Tokens are not stored anywhere; validity is recomputed from the signature
/// and `exp` on every presentation.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer,
            ttl,
            validation,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.jwt_secret.as_bytes(),
            cfg.jwt_issuer.clone(),
            Duration::seconds(cfg.jwt_ttl_seconds),
        )
    }

    pub fn claims_for(&self, user_id: i64, username: &str, now: DateTime<Utc>) -> Claims {
        Claims {
            user_id,
            username: username.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("sign token: {e}")))
    }

    pub fn issue(&self, user_id: i64, username: &str) -> Result<String, AppError> {
        self.sign(&self.claims_for(user_id, username, Utc::now()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        // Checked before the library sees the token so a non-HMAC header can
        // never reach signature verification.
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;

        if claims.user_id <= 0 || claims.username.is_empty() {
            return Err(TokenError::Malformed);
        }

        Ok(claims)
    }
}
