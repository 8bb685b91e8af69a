//! Group endpoints
//!
//! Groups are per-user folders; deleting one deletes the forms filed in it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::*;
use crate::ApiState;

pub fn router(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/:id", get(get_group).put(update_group).delete(delete_group))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Fetch a group the caller owns; anybody else's is reported missing
pub(crate) async fn owned_group(state: &ApiState, user: &AuthUser, id: &str) -> ApiResult<Group> {
    match state.groups.get(id).await {
        Ok(group) if group.owner_id == user.id => Ok(group),
        _ => Err(ApiError::NotFound("Group".into())),
    }
}

fn validated_name(req: &GroupRequest) -> ApiResult<String> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Group name is required".into()));
    }
    Ok(name.to_string())
}

pub async fn list_groups(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<Group>>>> {
    let groups = state.groups.list_by_owner(&user.id).await?;
    Ok(Json(ApiResponse::success(groups)))
}

pub async fn create_group(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<GroupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Group>>)> {
    let group = Group {
        id: formsmith_core::new_id(),
        name: validated_name(&req)?,
        owner_id: user.id.clone(),
        created_at: Utc::now(),
    };
    state.groups.insert(group.clone()).await?;
    info!(group = %group.id, owner = %user.id, "group created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(group))))
}

pub async fn get_group(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Group>>> {
    let group = owned_group(&state, &user, &id).await?;
    Ok(Json(ApiResponse::success(group)))
}

pub async fn update_group(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<GroupRequest>,
) -> ApiResult<Json<ApiResponse<Group>>> {
    let mut group = owned_group(&state, &user, &id).await?;
    group.name = validated_name(&req)?;
    state.groups.save(&group).await?;
    Ok(Json(ApiResponse::success(group)))
}

pub async fn delete_group(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_group(&state, &user, &id).await?;
    let removed = state.forms.delete_by_group(&user.id, &id).await?;
    state.groups.delete(&id).await?;
    info!(group = %id, forms = removed, "group deleted");
    Ok(StatusCode::NO_CONTENT)
}
