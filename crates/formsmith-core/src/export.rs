//! Client-side export and import of form documents

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::Form;
use crate::{FormsError, Result};

pub const EXPORT_CONTENT_TYPE: &str = "application/json";

/// A downloadable rendering of a form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedDocument {
    pub file_name: String,
    pub content_type: String,
    pub body: String,
}

fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "form".to_string()
    } else {
        out
    }
}

/// Serialize the in-memory form. No network involved.
pub fn export_form(form: &Form) -> Result<ExportedDocument> {
    let body = serde_json::to_string_pretty(form)
        .map_err(|e| FormsError::InvalidDocument(e.to_string()))?;
    Ok(ExportedDocument {
        file_name: format!("{}.json", slug(&form.title)),
        content_type: EXPORT_CONTENT_TYPE.to_string(),
        body,
    })
}

/// Parse an exported document into a new, unsaved form.
pub fn import_form(body: &str) -> Result<Form> {
    let mut form: Form =
        serde_json::from_str(body).map_err(|e| FormsError::InvalidDocument(e.to_string()))?;
    form.id = None;
    form.normalize();
    Ok(form)
}
