//! Formsmith Form Builder Core
//!
//! The editing model behind the form builder: a multi-page form document,
//! a bounded undo/redo history, the structural mutations the editor is
//! allowed to perform, and the drop-position resolver used by drag-and-drop.
//!
//! ## Features
//! - Multi-page forms with typed fields
//! - Linear undo/redo over copy-on-write snapshots (50 entries)
//! - Insert / move / duplicate / delete fields and pages
//! - Settings with cross-field dependency rules
//! - Templates and JSON export/import
//!
//! ```text
//!   Template ──instantiate──▶ Form ◀──checkpoint── HistoryStack
//!                              │
//!                       FormEditor (mutations, Outcome)
//!                              │
//!              DropGeometry ───┘  resolve_insert_index
//! ```

pub mod dnd;
pub mod domain;
pub mod editor;
pub mod export;
pub mod history;
pub mod templates;

pub use dnd::{resolve_insert_index, DropGeometry, FieldBox};
pub use domain::aggregates::{Form, Page, DEFAULT_THEME};
pub use domain::events::{Notification, NotificationLevel};
pub use domain::settings::{FormSettings, SettingChange};
pub use domain::value_objects::{Field, FieldType, FieldValidation, DEFAULT_OPTIONS};
pub use editor::{FormEditor, IgnoreReason, Outcome};
pub use export::{export_form, import_form, ExportedDocument};
pub use history::{HistoryStack, MAX_HISTORY};
pub use templates::Template;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormsError {
    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Setting rejected: {0}")]
    SettingRejected(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, FormsError>;

/// Fresh identifier for fields, pages and forms created on the client.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
