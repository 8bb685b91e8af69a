//! Account endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::{hash_password, new_salt, require_auth, verify_password, AuthUser};
use crate::models::*;
use crate::storage::RepositoryError;
use crate::ApiState;

const MIN_PASSWORD_LEN: usize = 6;

pub fn router(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

pub async fn register(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let salt = new_salt();
    let user = User {
        id: formsmith_core::new_id(),
        name: name.to_string(),
        password_hash: hash_password(&req.password, &salt),
        salt,
        email,
        created_at: Utc::now(),
    };

    state.users.insert(user.clone()).await.map_err(|e| match e {
        RepositoryError::Conflict(_) => ApiError::Conflict("Email already registered".into()),
        other => other.into(),
    })?;
    info!(user = %user.id, "registered");

    let token = state.keys.issue(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse { token, user: user.profile() })),
    ))
}

pub async fn login(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let user = state
        .users
        .find_by_email(req.email.trim())
        .await
        .map_err(|_| ApiError::InvalidCredentials)?;
    if !verify_password(&user, &req.password) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.keys.issue(&user)?;
    Ok(Json(ApiResponse::success(AuthResponse { token, user: user.profile() })))
}

pub async fn me(
    State(state): State<Arc<ApiState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let user = state.users.get(&caller.id).await?;
    Ok(Json(ApiResponse::success(user.profile())))
}
