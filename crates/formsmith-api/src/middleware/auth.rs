//! Authentication middleware
//!
//! Bearer tokens are HS256 JWTs. Every rejection carries a machine-readable
//! code and the page the client should send the user to.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::models::User;
use crate::ApiState;

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthCode {
    MissingToken,
    TokenExpired,
    MalformedToken,
    InvalidToken,
}

impl AuthCode {
    fn message(self) -> &'static str {
        match self {
            Self::MissingToken => "Authentication required",
            Self::TokenExpired => "Session expired, please sign in again",
            Self::MalformedToken => "Malformed authentication token",
            Self::InvalidToken => "Invalid authentication token",
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

/// The signed-in caller, inserted into request extensions by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(self.ttl_hours);
        self.sign(&Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        })
    }

    pub fn sign(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthCode> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthCode::TokenExpired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AuthCode::MalformedToken,
                _ => AuthCode::InvalidToken,
            })
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").field("ttl_hours", &self.ttl_hours).finish_non_exhaustive()
    }
}

pub fn unauthorized(state: &ApiState, code: AuthCode) -> ApiError {
    ApiError::Unauthorized {
        code,
        message: code.message().to_string(),
        redirect_to: state.config.redirect_to.clone(),
    }
}

/// Extract the raw token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthCode> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthCode::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthCode::MalformedToken)?.trim();
    if value.is_empty() {
        return Err(AuthCode::MissingToken);
    }
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                Err(AuthCode::MissingToken)
            } else {
                Ok(token)
            }
        }
        _ => Err(AuthCode::MalformedToken),
    }
}

/// Resolve the caller from request headers
pub async fn authenticate(state: &ApiState, headers: &HeaderMap) -> ApiResult<AuthUser> {
    let claims = bearer_token(headers)
        .and_then(|token| state.keys.verify(token))
        .map_err(|code| {
            tracing::debug!(?code, "rejected bearer token");
            unauthorized(state, code)
        })?;

    // a token outliving its account is no longer valid
    let user = state
        .users
        .get(&claims.sub)
        .await
        .map_err(|_| unauthorized(state, AuthCode::InvalidToken))?;

    Ok(AuthUser { id: user.id, email: user.email, name: user.name })
}

/// Route layer for owner-scoped endpoints
pub async fn require_auth(
    State(state): State<Arc<ApiState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// ============ Passwords ============

pub fn new_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(user: &User, password: &str) -> bool {
    hash_password(password, &user.salt) == user.password_hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user() -> User {
        User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            salt: String::new(),
            created_at: chrono::Utc::now(),
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthCode::MissingToken));
        assert_eq!(bearer_token(&headers("Bearer ")), Err(AuthCode::MissingToken));
        assert_eq!(bearer_token(&headers("Basic abc")), Err(AuthCode::MalformedToken));
        assert_eq!(bearer_token(&headers("abc")), Err(AuthCode::MalformedToken));
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Ok("abc.def"));
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = JwtKeys::new("secret", 1);
        let token = keys.issue(&user()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
    }

    #[test]
    fn test_expired_token() {
        let keys = JwtKeys::new("secret", 1);
        let past = (chrono::Utc::now().timestamp() - 3600) as usize;
        let token = keys
            .sign(&Claims { sub: "u1".into(), email: "a@b".into(), iat: past, exp: past })
            .unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), AuthCode::TokenExpired);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let keys = JwtKeys::new("secret", 1);
        assert_eq!(keys.verify("not-a-jwt").unwrap_err(), AuthCode::MalformedToken);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = JwtKeys::new("one", 1).issue(&user()).unwrap();
        assert_eq!(JwtKeys::new("two", 1).verify(&token).unwrap_err(), AuthCode::InvalidToken);
    }

    #[test]
    fn test_password_hash_is_salted() {
        let a = hash_password("hunter22", "s1");
        assert_ne!(a, hash_password("hunter22", "s2"));
        let stored = User { password_hash: a, salt: "s1".into(), ..user() };
        assert!(verify_password(&stored, "hunter22"));
        assert!(!verify_password(&stored, "hunter23"));
    }
}
