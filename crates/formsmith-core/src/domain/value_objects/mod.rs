//! Field value objects
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{new_id, FormsError};

/// Options seeded into choice fields when they are created.
pub const DEFAULT_OPTIONS: [&str; 2] = ["Option 1", "Option 2"];

const COPY_SUFFIX: &str = " (Copy)";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Number,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Date,
    File,
}

impl FieldType {
    pub const ALL: [FieldType; 9] = [
        FieldType::Text,
        FieldType::Email,
        FieldType::Number,
        FieldType::Textarea,
        FieldType::Select,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Date,
        FieldType::File,
    ];

    /// Choice fields carry an option list.
    pub fn needs_options(self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio | FieldType::Checkbox)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Date => "date",
            FieldType::File => "file",
        }
    }

    /// Label given to a freshly created field of this type.
    pub fn default_label(self) -> &'static str {
        match self {
            FieldType::Text => "Text Field",
            FieldType::Email => "Email",
            FieldType::Number => "Number",
            FieldType::Textarea => "Long Answer",
            FieldType::Select => "Dropdown",
            FieldType::Radio => "Multiple Choice",
            FieldType::Checkbox => "Checkboxes",
            FieldType::Date => "Date",
            FieldType::File => "File Upload",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FormsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| FormsError::UnknownFieldType(s.to_string()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A single input definition on a page.
///
/// `id` must be unique within the owning page; the editor uses it to anchor
/// drag targets and to address updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
}

impl Field {
    pub fn new(field_type: FieldType) -> Self {
        let options = field_type
            .needs_options()
            .then(|| DEFAULT_OPTIONS.iter().map(|o| o.to_string()).collect());
        Self {
            id: new_id(),
            field_type,
            label: field_type.default_label().to_string(),
            placeholder: None,
            required: false,
            options,
            validation: None,
        }
    }

    pub fn labeled(field_type: FieldType, label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::new(field_type) }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Clone under a fresh id with the label marked as a copy.
    pub fn duplicate(&self) -> Self {
        Self {
            id: new_id(),
            label: format!("{}{}", self.label, COPY_SUFFIX),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_fields_get_default_options() {
        let select = Field::new(FieldType::Select);
        assert_eq!(select.options.as_deref(), Some(&["Option 1".to_string(), "Option 2".to_string()][..]));
        assert!(!select.required);

        let text = Field::new(FieldType::Text);
        assert!(text.options.is_none());
        assert_eq!(text.label, "Text Field");
    }

    #[test]
    fn test_field_type_parse() {
        assert_eq!("Email".parse::<FieldType>().unwrap(), FieldType::Email);
        assert_eq!(" textarea ".parse::<FieldType>().unwrap(), FieldType::Textarea);
        assert!(matches!("slider".parse::<FieldType>(), Err(FormsError::UnknownFieldType(_))));
    }

    #[test]
    fn test_duplicate_keeps_original() {
        let original = Field::labeled(FieldType::Radio, "Q1").required();
        let copy = original.duplicate();
        assert_eq!(copy.label, "Q1 (Copy)");
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.options, original.options);
        assert!(copy.required);
        assert_eq!(original.label, "Q1");
    }

    #[test]
    fn test_wire_shape_uses_type_key() {
        let field = Field::labeled(FieldType::Number, "Age");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "number");
        assert!(json.get("options").is_none());
    }
}
