//! Form endpoints
//!
//! Everything except `view` and `submit` is owner-scoped: a form that exists
//! but belongs to someone else is reported as missing.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{middleware, Extension, Json, Router};
use chrono::Utc;
use formsmith_core::Form;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::{authenticate, require_auth, AuthUser};
use crate::models::*;
use crate::routes::groups::owned_group;
use crate::storage::RepositoryError;
use crate::ApiState;

pub fn router(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    let owner = Router::new()
        .route("/", get(list_forms).post(create_form))
        .route("/:id", get(get_form).put(update_form).delete(delete_form))
        .route("/:id/rename", put(rename_form))
        .route("/:id/duplicate", post(duplicate_form))
        .route("/:id/export", get(export_form))
        .route("/:id/share", get(share_form))
        .route("/:id/responses", get(list_responses))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route("/:id/view", get(view_form))
        .route("/:id/submit", post(submit_form));

    owner.merge(public)
}

async fn owned_form(state: &ApiState, user: &AuthUser, id: &str) -> ApiResult<StoredForm> {
    match state.forms.get(id).await {
        Ok(stored) if stored.owner_id == user.id => Ok(stored),
        Ok(_) | Err(RepositoryError::NotFound(_)) => Err(ApiError::NotFound("Form".into())),
        Err(e) => Err(e.into()),
    }
}

/// A form filed in a group must be filed in one of the caller's groups
async fn check_group(state: &ApiState, user: &AuthUser, form: &Form) -> ApiResult<()> {
    if !form.group_id.is_empty() {
        owned_group(state, user, &form.group_id).await?;
    }
    Ok(())
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()).map(str::trim))
        .map(str::to_string)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Labels of required fields left unanswered
fn missing_answers<'a>(form: &'a Form, request: &SubmitRequest) -> Vec<&'a str> {
    form.fields()
        .filter(|f| f.required && is_blank(request.answers.get(&f.id)))
        .map(|f| f.label.as_str())
        .collect()
}

pub async fn list_forms(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListFormsParams>,
) -> ApiResult<Json<ApiResponse<Vec<FormSummary>>>> {
    let forms = state.forms.list_by_owner(&user.id).await?;
    let summaries = forms
        .iter()
        .filter(|f| params.group_id.as_deref().map_or(true, |g| f.form.group_id == g))
        .map(StoredForm::summary)
        .collect();
    Ok(Json(ApiResponse::success(summaries)))
}

pub async fn create_form(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut form): Json<Form>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Form>>)> {
    check_group(&state, &user, &form).await?;
    form.normalize();

    let id = form
        .id
        .take()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(formsmith_core::new_id);
    let stored = StoredForm::new(id, user.id.clone(), form);
    state.forms.insert(stored.clone()).await?;

    info!(form = %stored.id, owner = %user.id, "form created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(stored.form))))
}

pub async fn get_form(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Form>>> {
    let stored = owned_form(&state, &user, &id).await?;
    Ok(Json(ApiResponse::success(stored.form)))
}

pub async fn update_form(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(mut form): Json<Form>,
) -> ApiResult<Json<ApiResponse<Form>>> {
    owned_form(&state, &user, &id).await?;
    check_group(&state, &user, &form).await?;
    form.normalize();
    form.id = Some(id.clone());
    let saved = state.forms.replace_form(&id, form).await?;

    debug!(form = %id, "form updated");
    Ok(Json(ApiResponse::success(saved)))
}

pub async fn delete_form(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_form(&state, &user, &id).await?;
    state.forms.delete(&id).await?;
    info!(form = %id, "form deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rename_form(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<ApiResponse<Form>>> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".into()));
    }
    owned_form(&state, &user, &id).await?;
    let renamed = state.forms.rename(&id, title).await?;
    Ok(Json(ApiResponse::success(renamed)))
}

pub async fn duplicate_form(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Form>>)> {
    let original = owned_form(&state, &user, &id).await?;
    let mut form = original.form;
    form.title = format!("{} (Copy)", form.title);

    let copy = StoredForm::new(formsmith_core::new_id(), user.id.clone(), form);
    state.forms.insert(copy.clone()).await?;
    info!(from = %id, form = %copy.id, "form duplicated");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(copy.form))))
}

pub async fn export_form(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<FormExport>>> {
    let stored = owned_form(&state, &user, &id).await?;
    Ok(Json(ApiResponse::success(FormExport {
        form: stored.form,
        submissions: stored.submissions,
        views: stored.views,
    })))
}

pub async fn share_form(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<ShareLink>>> {
    let stored = owned_form(&state, &user, &id).await?;
    let base = state.config.public_base_url.trim_end_matches('/');
    Ok(Json(ApiResponse::success(ShareLink {
        url: format!("{base}/forms/{}", stored.id),
        form_id: stored.id,
    })))
}

pub async fn list_responses(
    State(state): State<Arc<ApiState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<Submission>>>> {
    let stored = owned_form(&state, &user, &id).await?;
    Ok(Json(ApiResponse::success(stored.submissions)))
}

// ============ Public ============

pub async fn view_form(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<ApiResponse<Form>>> {
    let stored = state
        .forms
        .get(&id)
        .await
        .map_err(|_| ApiError::NotFound("Form".into()))?;
    state
        .forms
        .record_view(&id, View { ip: client_ip(&headers), timestamp: Utc::now() })
        .await?;
    Ok(Json(ApiResponse::success(stored.form)))
}

pub async fn submit_form(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SubmissionReceipt>>)> {
    let stored = state
        .forms
        .get(&id)
        .await
        .map_err(|_| ApiError::NotFound("Form".into()))?;
    let settings = &stored.form.settings;

    // a stale token only matters when the form insists on a signed-in user
    let user = match authenticate(&state, &headers).await {
        Ok(user) => Some(user),
        Err(e) if settings.require_login => return Err(e),
        Err(_) => None,
    };

    let missing = missing_answers(&stored.form, &req);
    if !missing.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Missing answers for: {}",
            missing.join(", ")
        )));
    }

    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .or_else(|| user.as_ref().map(|u| u.email.clone()));
    if settings.collect_emails && email.is_none() {
        return Err(ApiError::BadRequest("An email address is required".into()));
    }

    let submission = Submission {
        id: formsmith_core::new_id(),
        answers: req.answers,
        timestamp: Utc::now(),
        ip: client_ip(&headers),
        user_id: user.map(|u| u.id),
        email,
    };
    let receipt = SubmissionReceipt {
        id: submission.id.clone(),
        form_id: stored.id.clone(),
        timestamp: submission.timestamp,
    };

    state
        .forms
        .append_submission(&id, submission, settings.limit_to_one_response)
        .await?;
    debug!(form = %id, submission = %receipt.id, "response recorded");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(receipt))))
}
