//! Editing session: one form, its editor, and its save/load lifecycle
//!
//! ```text
//! Loading ──▶ Ready | LoadError
//! Ready ──edit──▶ Ready ──save──▶ Saved | SaveError ──edit──▶ Ready
//! any 401 ──▶ SessionExpired
//! ```
//!
//! Failed loads and saves never touch the document already in memory.

use formsmith_core::{export_form, new_id, ExportedDocument, Form, FormEditor, Notification};
use tracing::{info, warn};

use crate::error::ClientError;
use crate::store::FormStore;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Ready,
    LoadError(String),
    Saved,
    SaveError(String),
    SessionExpired { redirect_to: String },
}

/// Answer to "may the user navigate away right now?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveCheck {
    Proceed,
    /// Unsaved edits exist; show the confirmation modal
    ConfirmationRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveChoice {
    Discard,
    SaveThenLeave,
    Stay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Leave,
    Stay,
}

pub struct EditingSession<S: FormStore> {
    store: S,
    editor: FormEditor,
    state: SessionState,
    has_document: bool,
}

impl<S: FormStore> EditingSession<S> {
    /// Session over a form built in memory (blank or template-seeded)
    pub fn new(store: S, form: Form) -> Self {
        Self {
            store,
            editor: FormEditor::new(form),
            state: SessionState::Ready,
            has_document: true,
        }
    }

    /// Session for an existing form; check [`EditingSession::state`] for
    /// the outcome of the initial load.
    pub async fn open(store: S, id: &str) -> Self {
        let mut session = Self {
            store,
            editor: FormEditor::new(Form::new("", "")),
            state: SessionState::Loading,
            has_document: false,
        };
        // the error is already reflected in `state` and the notifications
        let _ = session.load(id).await;
        session
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn editor(&self) -> &FormEditor {
        &self.editor
    }

    pub fn form(&self) -> &Form {
        self.editor.form()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_dirty(&self) -> bool {
        self.editor.is_dirty()
    }

    pub fn is_editable(&self) -> bool {
        match self.state {
            SessionState::Ready | SessionState::Saved | SessionState::SaveError(_) => true,
            SessionState::LoadError(_) => self.has_document,
            SessionState::Loading | SessionState::SessionExpired { .. } => false,
        }
    }

    /// Run an edit against the editor. `None` when the session holds no
    /// editable document. A finished save attempt returns to `Ready`.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut FormEditor) -> R) -> Option<R> {
        if !self.is_editable() {
            return None;
        }
        let result = f(&mut self.editor);
        if matches!(self.state, SessionState::Saved | SessionState::SaveError(_) | SessionState::LoadError(_)) {
            self.state = SessionState::Ready;
        }
        Some(result)
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.editor.take_notifications()
    }

    /// Fetch `id` for editing. On failure the previously loaded form stays.
    pub async fn load(&mut self, id: &str) -> Result<()> {
        self.state = SessionState::Loading;
        match self.store.fetch(id).await {
            Ok(form) => {
                info!(form_id = id, pages = form.page_count(), "form loaded");
                self.editor.replace_form(form);
                self.has_document = true;
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(err) => {
                warn!(form_id = id, error = %err, "form load failed");
                self.fail(&err, SessionState::LoadError);
                Err(err)
            }
        }
    }

    /// Create on first save (with a client-generated id), update afterwards.
    /// Refused without a store call when no document was ever loaded.
    pub async fn save(&mut self) -> Result<()> {
        if !self.has_document {
            warn!("save requested with no form loaded");
            return Err(ClientError::NoDocument);
        }
        let mut payload = self.editor.form().clone();
        let result = match payload.id.clone() {
            None => {
                payload.id = Some(new_id());
                self.store.create(&payload).await
            }
            Some(id) => self.store.update(&id, &payload).await,
        };

        match result {
            Ok(saved) => {
                let id = saved.id.or(payload.id).unwrap_or_default();
                info!(form_id = %id, "form saved");
                self.editor.assign_id(id);
                self.editor.mark_saved();
                self.state = SessionState::Saved;
                self.editor.notify(Notification::success("Form saved"));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "form save failed");
                self.fail(&err, SessionState::SaveError);
                Err(err)
            }
        }
    }

    /// Serialize the current document; no network involved.
    pub fn export(&self) -> formsmith_core::Result<ExportedDocument> {
        export_form(self.editor.form())
    }

    /// Guard for navigation away from the editor.
    pub fn request_leave(&self) -> LeaveCheck {
        if self.has_document && self.editor.is_dirty() {
            LeaveCheck::ConfirmationRequired
        } else {
            LeaveCheck::Proceed
        }
    }

    /// Act on the user's answer to the unsaved-changes modal. A failed
    /// save keeps the user in the editor.
    pub async fn resolve_leave(&mut self, choice: LeaveChoice) -> LeaveDecision {
        match choice {
            LeaveChoice::Discard => LeaveDecision::Leave,
            LeaveChoice::Stay => LeaveDecision::Stay,
            LeaveChoice::SaveThenLeave => match self.save().await {
                Ok(()) => LeaveDecision::Leave,
                Err(_) => LeaveDecision::Stay,
            },
        }
    }

    fn fail(&mut self, err: &ClientError, state: impl FnOnce(String) -> SessionState) {
        match err {
            ClientError::Unauthorized { code, redirect_to, .. } => {
                info!(%code, redirect_to = %redirect_to, "session invalid");
                self.editor
                    .notify(Notification::error("Your session has expired. Please log in again."));
                self.state = SessionState::SessionExpired { redirect_to: redirect_to.clone() };
            }
            other => {
                let message = other.to_string();
                self.editor.notify(Notification::error(message.clone()));
                self.state = state(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorCode;
    use async_trait::async_trait;
    use formsmith_core::{FieldType, Template};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Copy, PartialEq)]
    enum Failure {
        None,
        Server,
        Expired,
    }

    #[derive(Default)]
    struct MemoryStore {
        forms: Mutex<HashMap<String, Form>>,
        calls: Mutex<Vec<String>>,
        failure: Mutex<Option<Failure>>,
    }

    impl MemoryStore {
        fn failing(&self, failure: Failure) {
            *self.failure.lock() = Some(failure);
        }

        fn check(&self) -> Result<()> {
            match self.failure.lock().unwrap_or(Failure::None) {
                Failure::None => Ok(()),
                Failure::Server => Err(ClientError::Api {
                    status: 500,
                    code: "internal".into(),
                    message: "boom".into(),
                }),
                Failure::Expired => Err(ClientError::Unauthorized {
                    code: AuthErrorCode::TokenExpired,
                    message: "Token expired".into(),
                    redirect_to: "/login".into(),
                }),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl FormStore for Arc<MemoryStore> {
        async fn create(&self, form: &Form) -> Result<Form> {
            self.check()?;
            let id = form.id.clone().unwrap_or_default();
            self.calls.lock().push(format!("POST {}", id));
            self.forms.lock().insert(id, form.clone());
            Ok(form.clone())
        }

        async fn update(&self, id: &str, form: &Form) -> Result<Form> {
            self.check()?;
            self.calls.lock().push(format!("PUT {}", id));
            self.forms.lock().insert(id.to_string(), form.clone());
            Ok(form.clone())
        }

        async fn fetch(&self, id: &str) -> Result<Form> {
            self.check()?;
            self.forms.lock().get(id).cloned().ok_or_else(|| ClientError::Api {
                status: 404,
                code: "not_found".into(),
                message: "Form not found".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_first_save_creates_then_updates() {
        let store = Arc::new(MemoryStore::default());
        let mut session = EditingSession::new(store.clone(), Template::ContactForm.instantiate("g"));
        assert!(session.form().is_new());

        session.save().await.unwrap();
        let id = session.form().id.clone().expect("id assigned on first save");
        assert_eq!(session.state(), &SessionState::Saved);
        assert!(!session.is_dirty());

        session.edit(|ed| ed.add_field(FieldType::Date));
        assert_eq!(session.state(), &SessionState::Ready);
        session.save().await.unwrap();

        assert_eq!(store.calls(), vec![format!("POST {}", id), format!("PUT {}", id)]);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_local_state() {
        let store = Arc::new(MemoryStore::default());
        let mut session = EditingSession::new(store.clone(), Form::new("Draft", "g"));
        session.edit(|ed| ed.add_field(FieldType::Text));
        let before = session.form().clone();

        store.failing(Failure::Server);
        assert!(session.save().await.is_err());

        assert_eq!(session.form(), &before);
        assert!(session.form().is_new());
        assert!(session.is_dirty());
        assert!(matches!(session.state(), SessionState::SaveError(_)));
        assert!(session.take_notifications().iter().any(|n| n.is_error()));

        store.failing(Failure::None);
        session.save().await.unwrap();
        assert_eq!(session.state(), &SessionState::Saved);
    }

    #[tokio::test]
    async fn test_load_normalizes_and_failure_keeps_previous() {
        let store = Arc::new(MemoryStore::default());
        let mut stored = Form::new("Stored", "g");
        stored.id = Some("f1".into());
        Arc::make_mut(&mut stored.pages[0]).id.clear();
        store.forms.lock().insert("f1".into(), stored);

        let mut session = EditingSession::open(store.clone(), "f1").await;
        assert_eq!(session.state(), &SessionState::Ready);
        assert!(!session.form().pages[0].id.is_empty());

        assert!(session.load("missing").await.is_err());
        assert!(matches!(session.state(), SessionState::LoadError(_)));
        assert_eq!(session.form().title, "Stored");
        assert!(session.is_editable());

        session.edit(|ed| ed.set_title("Edited"));
        assert_eq!(session.state(), &SessionState::Ready);
    }

    #[tokio::test]
    async fn test_initial_load_failure_is_not_editable() {
        let store = Arc::new(MemoryStore::default());
        let mut session = EditingSession::open(store, "nope").await;
        assert!(matches!(session.state(), SessionState::LoadError(_)));
        assert!(session.edit(|ed| ed.add_page()).is_none());
        assert_eq!(session.request_leave(), LeaveCheck::Proceed);
    }

    #[tokio::test]
    async fn test_save_without_loaded_form_is_refused() {
        let store = Arc::new(MemoryStore::default());
        let mut session = EditingSession::open(store.clone(), "gone").await;
        assert!(matches!(session.state(), SessionState::LoadError(_)));

        let err = session.save().await.unwrap_err();
        assert!(matches!(err, ClientError::NoDocument));
        assert_eq!(session.resolve_leave(LeaveChoice::SaveThenLeave).await, LeaveDecision::Stay);
        assert!(store.calls().is_empty());
        assert!(store.forms.lock().is_empty());
        assert!(matches!(session.state(), SessionState::LoadError(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_expires_session() {
        let store = Arc::new(MemoryStore::default());
        let mut session = EditingSession::new(store.clone(), Form::new("Draft", "g"));
        store.failing(Failure::Expired);

        let err = session.save().await.unwrap_err();
        assert!(err.is_auth_error());
        assert_eq!(session.state(), &SessionState::SessionExpired { redirect_to: "/login".into() });
        assert!(session.edit(|ed| ed.add_page()).is_none());
    }

    #[tokio::test]
    async fn test_leave_guard() {
        let store = Arc::new(MemoryStore::default());
        let mut session = EditingSession::new(store.clone(), Form::new("Draft", "g"));
        assert_eq!(session.request_leave(), LeaveCheck::Proceed);

        session.edit(|ed| ed.add_field(FieldType::Email));
        assert_eq!(session.request_leave(), LeaveCheck::ConfirmationRequired);
        assert_eq!(session.resolve_leave(LeaveChoice::Stay).await, LeaveDecision::Stay);

        store.failing(Failure::Server);
        assert_eq!(session.resolve_leave(LeaveChoice::SaveThenLeave).await, LeaveDecision::Stay);

        store.failing(Failure::None);
        assert_eq!(session.resolve_leave(LeaveChoice::SaveThenLeave).await, LeaveDecision::Leave);
        assert_eq!(session.request_leave(), LeaveCheck::Proceed);
        assert_eq!(session.resolve_leave(LeaveChoice::Discard).await, LeaveDecision::Leave);
    }

    #[test]
    fn test_failed_open_has_nothing_to_edit() {
        let store = Arc::new(MemoryStore::default());
        store.failing(Failure::Server);
        let mut session = tokio_test::block_on(EditingSession::open(store.clone(), "f1"));
        assert!(matches!(session.state(), SessionState::LoadError(_)));
        assert!(session.edit(|e| e.add_field(FieldType::Text)).is_none());

        // recovered backend, but the form still does not exist
        store.failing(Failure::None);
        tokio_test::assert_err!(tokio_test::block_on(session.load("f1")));
        assert!(!session.is_editable());
    }

    #[tokio::test]
    async fn test_export_is_local() {
        let store = Arc::new(MemoryStore::default());
        let session = EditingSession::new(store.clone(), Template::Quiz.instantiate("g"));
        let doc = session.export().unwrap();
        assert_eq!(doc.file_name, "quiz.json");
        assert!(store.calls().is_empty());
    }
}
