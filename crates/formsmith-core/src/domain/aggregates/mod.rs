//! Form aggregate
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::settings::FormSettings;
use crate::domain::value_objects::Field;
use crate::new_id;

pub const DEFAULT_THEME: &str = "light";

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

/// A named, ordered group of fields. `order` is a display hint only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Empty when the page came from a document that never assigned one.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Page {
    /// Empty page titled `Page n` (1-based).
    pub fn numbered(n: usize) -> Self {
        Self {
            id: new_id(),
            order: n.saturating_sub(1) as u32,
            title: format!("Page {}", n),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn position(&self, field_id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == field_id)
    }

    /// Regenerate ids that collide with an earlier field on this page.
    /// Returns how many fields were re-keyed.
    fn dedupe_field_ids(&mut self) -> usize {
        let mut seen = HashSet::with_capacity(self.fields.len());
        let mut rekeyed = 0;
        for field in &mut self.fields {
            if field.id.is_empty() || !seen.insert(field.id.clone()) {
                field.id = new_id();
                seen.insert(field.id.clone());
                rekeyed += 1;
            }
        }
        rekeyed
    }
}

/// The editable document.
///
/// Pages sit behind `Arc` so that history snapshots share every page an edit
/// did not touch; [`Form::page_mut`] copies a page only when it is shared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub group_id: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pages: Vec<Arc<Page>>,
    #[serde(default)]
    pub settings: FormSettings,
}

impl Form {
    /// Unsaved form with a single empty page.
    pub fn new(title: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            id: None,
            group_id: group_id.into(),
            theme: default_theme(),
            title: title.into(),
            description: String::new(),
            pages: vec![Arc::new(Page::numbered(1))],
            settings: FormSettings::default(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index).map(|p| p.as_ref())
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index).map(Arc::make_mut)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn field_count(&self) -> usize {
        self.pages.iter().map(|p| p.fields.len()).sum()
    }

    /// Iterate every field across pages in display order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.pages.iter().flat_map(|p| p.fields.iter())
    }

    /// Locate a field as `(page_index, field_index)`.
    pub fn locate(&self, field_id: &str) -> Option<(usize, usize)> {
        self.pages
            .iter()
            .enumerate()
            .find_map(|(pi, page)| page.position(field_id).map(|fi| (pi, fi)))
    }

    pub fn ensure_page(&mut self) {
        if self.pages.is_empty() {
            self.pages.push(Arc::new(Page::numbered(1)));
        }
    }

    /// Bring a document from outside the editor in line with the editor's
    /// invariants: at least one page, every page keyed, field ids unique per
    /// page, settings consistent.
    pub fn normalize(&mut self) {
        self.ensure_page();
        for index in 0..self.pages.len() {
            let needs_work = {
                let page = &self.pages[index];
                page.id.is_empty() || {
                    let mut seen = HashSet::new();
                    page.fields.iter().any(|f| f.id.is_empty() || !seen.insert(f.id.as_str()))
                }
            };
            if !needs_work {
                continue;
            }
            let page = Arc::make_mut(&mut self.pages[index]);
            if page.id.is_empty() {
                page.id = new_id();
            }
            let rekeyed = page.dedupe_field_ids();
            if rekeyed > 0 {
                tracing::debug!(page = %page.id, rekeyed, "re-keyed duplicate field ids");
            }
        }
        self.settings.normalize();
    }
}
