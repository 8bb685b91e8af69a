//! Field mutation engine
//!
//! [`FormEditor`] is the only way to change the structure of a form. Every
//! applied edit is checkpointed into the [`HistoryStack`] first. Edits that
//! reference a page or field that no longer exists are not errors; they come
//! back as [`Outcome::Ignored`] with the reason and leave the form alone.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dnd::DropGeometry;
use crate::domain::aggregates::{Form, Page};
use crate::domain::events::Notification;
use crate::domain::settings::SettingChange;
use crate::domain::value_objects::{Field, FieldType};
use crate::history::HistoryStack;
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(IgnoreReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    PageOutOfRange,
    FieldNotFound,
    NothingToUndo,
    NothingToRedo,
    LastPage,
    GeometryUnavailable,
    Unchanged,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IgnoreReason::PageOutOfRange => "page index out of range",
            IgnoreReason::FieldNotFound => "field not found",
            IgnoreReason::NothingToUndo => "nothing to undo",
            IgnoreReason::NothingToRedo => "nothing to redo",
            IgnoreReason::LastPage => "cannot remove the last page",
            IgnoreReason::GeometryUnavailable => "drop geometry unavailable",
            IgnoreReason::Unchanged => "no change",
        };
        f.write_str(s)
    }
}

fn ignored(op: &'static str, reason: IgnoreReason) -> Outcome {
    debug!(op, %reason, "edit ignored");
    Outcome::Ignored(reason)
}

/// Editing session over one form document.
#[derive(Debug)]
pub struct FormEditor {
    form: Form,
    active_page: usize,
    history: HistoryStack,
    dirty: bool,
    notifications: Vec<Notification>,
}

impl FormEditor {
    pub fn new(mut form: Form) -> Self {
        form.normalize();
        Self {
            form,
            active_page: 0,
            history: HistoryStack::new(),
            dirty: false,
            notifications: Vec::new(),
        }
    }

    pub fn with_history(form: Form, history: HistoryStack) -> Self {
        Self { history, ..Self::new(form) }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn active_page_index(&self) -> usize {
        self.active_page
    }

    pub fn active_page(&self) -> &Page {
        &self.form.pages[self.active_page]
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// True when there are edits since the last load or save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // =========================================================================
    // Session plumbing (not checkpointed)
    // =========================================================================

    /// Swap in a freshly loaded document, dropping history.
    pub fn replace_form(&mut self, mut form: Form) {
        form.normalize();
        self.form = form;
        self.active_page = 0;
        self.history.clear();
        self.dirty = false;
    }

    /// Adopt the identifier the server persisted the form under.
    pub fn assign_id(&mut self, id: impl Into<String>) {
        self.form.id = Some(id.into());
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn set_active_page(&mut self, index: usize) -> Outcome {
        if index >= self.form.page_count() {
            return ignored("set_active_page", IgnoreReason::PageOutOfRange);
        }
        self.active_page = index;
        Outcome::Applied
    }

    pub fn next_page(&mut self) -> Outcome {
        self.set_active_page(self.active_page + 1)
    }

    pub fn previous_page(&mut self) -> Outcome {
        match self.active_page.checked_sub(1) {
            Some(index) => self.set_active_page(index),
            None => ignored("previous_page", IgnoreReason::PageOutOfRange),
        }
    }

    // =========================================================================
    // Field mutations
    // =========================================================================

    /// Append a new field of `field_type` to the active page.
    pub fn add_field(&mut self, field_type: FieldType) -> Outcome {
        let field = Field::new(field_type);
        self.commit(|form, active| {
            if let Some(page) = form.page_mut(active) {
                page.fields.push(field);
            }
        });
        Outcome::Applied
    }

    /// Insert at `index` on page `page_index`, clamping `index` into
    /// `[0, fields.len()]`.
    pub fn insert_field_at(&mut self, field_type: FieldType, index: isize, page_index: usize) -> Outcome {
        let Some(page) = self.form.page(page_index) else {
            return ignored("insert_field_at", IgnoreReason::PageOutOfRange);
        };
        let at = index.clamp(0, page.fields.len() as isize) as usize;
        let field = Field::new(field_type);
        self.commit(|form, _| {
            if let Some(page) = form.page_mut(page_index) {
                page.fields.insert(at, field);
            }
        });
        Outcome::Applied
    }

    /// Insert right after `after_field_id` on the active page, or append
    /// when that field is gone.
    pub fn add_field_after(&mut self, after_field_id: &str, field_type: FieldType) -> Outcome {
        let page = self.active_page();
        let at = page
            .position(after_field_id)
            .map(|i| i + 1)
            .unwrap_or(page.fields.len());
        let field = Field::new(field_type);
        self.commit(|form, active| {
            if let Some(page) = form.page_mut(active) {
                page.fields.insert(at, field);
            }
        });
        Outcome::Applied
    }

    /// Replace a field wholesale. The replacement keeps `field_id` so page
    /// ids stay unique.
    pub fn update_field(&mut self, field_id: &str, mut updated: Field) -> Outcome {
        let Some(at) = self.active_page().position(field_id) else {
            return ignored("update_field", IgnoreReason::FieldNotFound);
        };
        updated.id = field_id.to_string();
        if self.active_page().fields[at] == updated {
            return ignored("update_field", IgnoreReason::Unchanged);
        }
        self.commit(|form, active| {
            if let Some(page) = form.page_mut(active) {
                page.fields[at] = updated;
            }
        });
        Outcome::Applied
    }

    pub fn delete_field(&mut self, field_id: &str) -> Outcome {
        let Some(at) = self.active_page().position(field_id) else {
            return ignored("delete_field", IgnoreReason::FieldNotFound);
        };
        self.commit(|form, active| {
            if let Some(page) = form.page_mut(active) {
                page.fields.remove(at);
            }
        });
        Outcome::Applied
    }

    /// Copy a field to the end of the active page with a fresh id and a
    /// `" (Copy)"` label.
    pub fn duplicate_field(&mut self, field_id: &str) -> Outcome {
        let Some(source) = self.active_page().field(field_id) else {
            return ignored("duplicate_field", IgnoreReason::FieldNotFound);
        };
        let copy = source.duplicate();
        self.commit(|form, active| {
            if let Some(page) = form.page_mut(active) {
                page.fields.push(copy);
            }
        });
        Outcome::Applied
    }

    /// Reorder a field within the active page. `to_index` is the position
    /// the field should occupy afterwards, clamped.
    pub fn move_field(&mut self, field_id: &str, to_index: isize) -> Outcome {
        let page = self.active_page();
        let Some(from) = page.position(field_id) else {
            return ignored("move_field", IgnoreReason::FieldNotFound);
        };
        let to = to_index.clamp(0, page.fields.len() as isize - 1) as usize;
        if from == to {
            return ignored("move_field", IgnoreReason::Unchanged);
        }
        self.commit(|form, active| {
            if let Some(page) = form.page_mut(active) {
                let field = page.fields.remove(from);
                page.fields.insert(to, field);
            }
        });
        Outcome::Applied
    }

    /// Drop a new field from the palette onto the active page.
    pub fn drop_field(&mut self, field_type: FieldType, geometry: &DropGeometry) -> Outcome {
        match geometry.resolve() {
            Some(index) => self.insert_field_at(field_type, index as isize, self.active_page),
            None => ignored("drop_field", IgnoreReason::GeometryUnavailable),
        }
    }

    /// Drop an existing field at a new position. `geometry` still contains
    /// the dragged block, so targets below it shift up by one.
    pub fn drop_existing_field(&mut self, field_id: &str, geometry: &DropGeometry) -> Outcome {
        let Some(target) = geometry.resolve() else {
            return ignored("drop_existing_field", IgnoreReason::GeometryUnavailable);
        };
        let Some(from) = self.active_page().position(field_id) else {
            return ignored("drop_existing_field", IgnoreReason::FieldNotFound);
        };
        let to = if target > from { target - 1 } else { target };
        self.move_field(field_id, to as isize)
    }

    // =========================================================================
    // Page mutations
    // =========================================================================

    /// Append an empty `Page N` and make it active.
    pub fn add_page(&mut self) -> Outcome {
        let page = Page::numbered(self.form.page_count() + 1);
        self.commit(|form, _| form.pages.push(Arc::new(page)));
        self.active_page = self.form.page_count() - 1;
        Outcome::Applied
    }

    pub fn delete_page(&mut self, page_index: usize) -> Outcome {
        if page_index >= self.form.page_count() {
            return ignored("delete_page", IgnoreReason::PageOutOfRange);
        }
        if self.form.page_count() == 1 {
            return ignored("delete_page", IgnoreReason::LastPage);
        }
        self.commit(|form, _| {
            form.pages.remove(page_index);
        });
        if self.active_page >= page_index && self.active_page > 0 {
            self.active_page -= 1;
        }
        Outcome::Applied
    }

    pub fn rename_page(&mut self, page_index: usize, title: impl Into<String>) -> Outcome {
        let title = title.into();
        match self.form.page(page_index) {
            None => ignored("rename_page", IgnoreReason::PageOutOfRange),
            Some(page) if page.title == title => ignored("rename_page", IgnoreReason::Unchanged),
            Some(_) => {
                self.commit(|form, _| {
                    if let Some(page) = form.page_mut(page_index) {
                        page.title = title;
                    }
                });
                Outcome::Applied
            }
        }
    }

    // =========================================================================
    // Form metadata and settings
    // =========================================================================

    pub fn set_title(&mut self, title: impl Into<String>) -> Outcome {
        let title = title.into();
        if self.form.title == title {
            return ignored("set_title", IgnoreReason::Unchanged);
        }
        self.commit(|form, _| form.title = title);
        Outcome::Applied
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Outcome {
        let description = description.into();
        if self.form.description == description {
            return ignored("set_description", IgnoreReason::Unchanged);
        }
        self.commit(|form, _| form.description = description);
        Outcome::Applied
    }

    pub fn set_theme(&mut self, theme: impl Into<String>) -> Outcome {
        let theme = theme.into();
        if self.form.theme == theme {
            return ignored("set_theme", IgnoreReason::Unchanged);
        }
        self.commit(|form, _| form.theme = theme);
        Outcome::Applied
    }

    pub fn set_group(&mut self, group_id: impl Into<String>) -> Outcome {
        let group_id = group_id.into();
        if self.form.group_id == group_id {
            return ignored("set_group", IgnoreReason::Unchanged);
        }
        self.commit(|form, _| form.group_id = group_id);
        Outcome::Applied
    }

    /// Apply a settings change with its dependency rules. A rejected change
    /// raises an error notification and leaves the form untouched.
    pub fn update_setting(&mut self, change: SettingChange) -> Result<Outcome> {
        let mut next = self.form.settings.clone();
        if let Err(err) = next.apply(change) {
            self.notify(Notification::error(err.to_string()));
            return Err(err);
        }
        if next == self.form.settings {
            return Ok(ignored("update_setting", IgnoreReason::Unchanged));
        }
        self.commit(|form, _| form.settings = next);
        Ok(Outcome::Applied)
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn undo(&mut self) -> Outcome {
        let Some(previous) = self.history.undo(&self.form) else {
            return ignored("undo", IgnoreReason::NothingToUndo);
        };
        self.restore(previous);
        self.notify(Notification::success("Undo successful"));
        Outcome::Applied
    }

    pub fn redo(&mut self) -> Outcome {
        let Some(next) = self.history.redo(&self.form) else {
            return ignored("redo", IgnoreReason::NothingToRedo);
        };
        self.restore(next);
        self.notify(Notification::success("Redo successful"));
        Outcome::Applied
    }

    fn restore(&mut self, form: Form) {
        self.form = form;
        self.active_page = self.active_page.min(self.form.page_count() - 1);
        self.dirty = true;
    }

    fn commit<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut Form, usize),
    {
        self.history.checkpoint(&self.form);
        edit(&mut self.form, self.active_page);
        self.dirty = true;
    }
}
