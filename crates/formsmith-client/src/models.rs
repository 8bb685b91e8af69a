//! Wire types exchanged with the REST backend
//!
//! Every response is decoded into one of these before it reaches the editor.
//! Missing required keys fail decoding instead of turning into defaults.

use chrono::{DateTime, Utc};
use formsmith_core::Form;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Public profile of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Token issued by login/register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Folder of forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupRequest<'a> {
    pub name: &'a str,
}

/// Row in the form listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub id: String,
    pub title: String,
    pub group_id: String,
    pub page_count: usize,
    pub field_count: usize,
    pub submission_count: usize,
    pub view_count: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameRequest<'a> {
    pub title: &'a str,
}

/// Answers keyed by field id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub answers: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: String,
    pub form_id: String,
    pub timestamp: DateTime<Utc>,
}

/// A stored response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub answers: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    #[serde(default)]
    pub ip: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Server-side export: the form with everything recorded against it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormExport {
    pub form: Form,
    pub submissions: Vec<Submission>,
    pub views: Vec<View>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub form_id: String,
    pub url: String,
}
