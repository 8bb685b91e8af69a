//! Application context
//!
//! Built once at startup and handed to whatever needs the API, the signed-in
//! user, or the UI theme. Nothing here is global.

use formsmith_core::{Form, Template, DEFAULT_THEME};
use parking_lot::RwLock;
use tracing::info;

use crate::client::{ClientConfig, FormsClient};
use crate::models::UserProfile;
use crate::session::EditingSession;
use crate::Result;

/// Who is signed in, if anyone
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

pub struct AppContext {
    client: FormsClient,
    auth: RwLock<AuthSession>,
    theme: RwLock<String>,
}

impl AppContext {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let auth = AuthSession { token: config.token.clone(), user: None };
        Ok(Self {
            client: FormsClient::with_config(config)?,
            auth: RwLock::new(auth),
            theme: RwLock::new(DEFAULT_THEME.to_string()),
        })
    }

    pub fn client(&self) -> &FormsClient {
        &self.client
    }

    pub fn auth(&self) -> AuthSession {
        self.auth.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.read().is_authenticated()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let response = self.client.login(email, password).await?;
        info!(user = %response.user.id, "signed in");
        *self.auth.write() = AuthSession {
            token: Some(response.token),
            user: Some(response.user.clone()),
        };
        Ok(response.user)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<UserProfile> {
        let response = self.client.register(name, email, password).await?;
        *self.auth.write() = AuthSession {
            token: Some(response.token),
            user: Some(response.user.clone()),
        };
        Ok(response.user)
    }

    pub fn logout(&self) {
        self.client.set_token(None);
        *self.auth.write() = AuthSession::default();
    }

    pub fn theme(&self) -> String {
        self.theme.read().clone()
    }

    pub fn set_theme(&self, theme: impl Into<String>) {
        *self.theme.write() = theme.into();
    }

    /// Start editing a new form seeded from `template`
    pub fn new_session(&self, template: Template, group_id: &str) -> EditingSession<FormsClient> {
        let mut form = template.instantiate(group_id);
        form.theme = self.theme();
        EditingSession::new(self.client.clone(), form)
    }

    pub fn session_for(&self, form: Form) -> EditingSession<FormsClient> {
        EditingSession::new(self.client.clone(), form)
    }

    pub async fn open_session(&self, form_id: &str) -> EditingSession<FormsClient> {
        EditingSession::open(self.client.clone(), form_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_starts_signed_out() {
        let ctx = AppContext::new(ClientConfig::default()).unwrap();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.theme(), DEFAULT_THEME);
    }

    #[test]
    fn test_new_session_uses_theme_preference() {
        let ctx = AppContext::new(ClientConfig::default()).unwrap();
        ctx.set_theme("dark");
        let session = ctx.new_session(Template::Feedback, "g");
        assert_eq!(session.form().theme, "dark");
        assert_eq!(session.form().title, "Feedback");
    }

    #[test]
    fn test_bad_base_url_is_config_error() {
        let config = ClientConfig { base_url: "not a url".into(), ..Default::default() };
        assert!(AppContext::new(config).is_err());
    }

    #[test]
    fn test_logout_clears_token() {
        let config = ClientConfig { token: Some("t".into()), ..Default::default() };
        let ctx = AppContext::new(config).unwrap();
        assert!(ctx.is_authenticated());
        ctx.logout();
        assert!(!ctx.is_authenticated());
        assert!(ctx.client().token().is_none());
    }
}
