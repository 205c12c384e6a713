//! Bearer token issuing and verification, plus password hashing for the
//! login routes.
//!
//! The verifier is a plain axum middleware. Nothing here decides which
//! routes it guards; see [`crate::routes::create_router`].

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::AppError;

const HEADER_ACCESS_TOKEN: &str = "x-access-token";
const HEADER_AUTHORIZATION: &str = "authorization";
const BEARER: &str = "Bearer ";

/// Claims carried by issued tokens and attached to verified requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier the token was issued for.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    inner: Arc<KeysInner>,
}

struct KeysInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            inner: Arc::new(KeysInner {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                validation: Validation::new(Algorithm::HS256),
                ttl,
            }),
        }
    }

    /// Signs a token for `user_id` that expires after the configured TTL.
    pub fn issue(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.inner.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp: iat.saturating_add(ttl),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.inner.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.inner.decoding, &self.inner.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!(error = %err, "token verification failed");
                AppError::InvalidOrExpiredToken
            })
    }
}

/// Pulls the token out of `x-access-token`, falling back to `authorization`.
/// The value must contain a `Bearer ` segment with something after it.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = [HEADER_ACCESS_TOKEN, HEADER_AUTHORIZATION]
        .into_iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|value| value.to_str().ok())
        .find(|value| !value.is_empty())
        .ok_or(AppError::MissingToken)?;

    value
        .split(BEARER)
        .nth(1)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::MissingToken)
}

/// Middleware rejecting requests without a valid bearer token. On success the
/// decoded [`Claims`] are available to handlers as an `Extension<Claims>`.
pub async fn verify_token(
    State(keys): State<TokenKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = keys.verify(bearer_token(request.headers())?)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await??;
    Ok(hash)
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Extension, Json, Router,
        body::Body,
        http::{Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;

    fn keys() -> TokenKeys {
        TokenKeys::new(b"test-secret", Duration::from_secs(3600))
    }

    fn headers(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().unwrap());
        headers
    }

    fn protected_app(keys: TokenKeys) -> Router {
        Router::new()
            .route(
                "/protected",
                get(|Extension(claims): Extension<Claims>| async move { Json(claims) }),
            )
            .layer(from_fn_with_state(keys, verify_token))
    }

    async fn call(
        app: Router,
        header: Option<(&'static str, String)>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().uri("/protected");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn bearer_token_reads_authorization_header() {
        let headers = headers("authorization", "Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Ok("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_prefers_access_token_header() {
        let mut headers = headers("authorization", "Bearer from-authorization");
        headers.insert("x-access-token", "Bearer from-access".parse().unwrap());
        assert_eq!(bearer_token(&headers), Ok("from-access"));
    }

    #[test]
    fn bearer_token_requires_a_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AppError::MissingToken));
    }

    #[test]
    fn bearer_token_requires_bearer_segment() {
        let wrong_scheme = headers("authorization", "Token abc");
        assert_eq!(bearer_token(&wrong_scheme), Err(AppError::MissingToken));

        let empty_token = headers("authorization", "Bearer ");
        assert_eq!(bearer_token(&empty_token), Err(AppError::MissingToken));
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys();
        let token = keys.issue("admin").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenKeys::new(b"other-secret", Duration::from_secs(3600));
        let token = other.issue("admin").unwrap();
        assert_eq!(keys().verify(&token), Err(AppError::InvalidOrExpiredToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let now = Utc::now().timestamp();
        let token = keys
            .sign(&Claims {
                sub: "admin".into(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert_eq!(keys.verify(&token), Err(AppError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn middleware_rejects_missing_header() {
        let (status, body) = call(protected_app(keys()), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessage"], "Token é necessário para verificação.");
    }

    #[tokio::test]
    async fn middleware_rejects_malformed_header() {
        let header = Some(("authorization", "abc.def.ghi".to_string()));
        let (status, body) = call(protected_app(keys()), header).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessage"], "Token é necessário para verificação.");
    }

    #[tokio::test]
    async fn middleware_rejects_invalid_token() {
        let header = Some(("authorization", "Bearer not-a-jwt".to_string()));
        let (status, body) = call(protected_app(keys()), header).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessage"], "Token expirado/inválido.");
    }

    #[tokio::test]
    async fn middleware_attaches_claims() {
        let keys = keys();
        let token = keys.issue("admin").unwrap();
        let header = Some(("x-access-token", format!("Bearer {token}")));
        let (status, body) = call(protected_app(keys), header).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sub"], "admin");
    }

    #[tokio::test]
    async fn verify_password_checks_bcrypt_hash() {
        let hash = bcrypt::hash("segredo", 4).unwrap();
        assert!(verify_password("segredo", &hash).await.unwrap());
        assert!(!verify_password("errado", &hash).await.unwrap());
    }
}
