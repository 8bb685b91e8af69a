//! HTTP client for the Formsmith REST API

use std::sync::Arc;
use std::time::Duration;

use formsmith_core::Form;
use parking_lot::RwLock;
use reqwest::{header, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{AuthErrorCode, ClientError};
use crate::models::*;
use crate::{Result, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, VERSION};

const DEFAULT_REDIRECT: &str = "/login";

/// Configuration for the Formsmith client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    /// Extra attempts for GET requests that fail transiently
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Formsmith API client
#[derive(Clone)]
pub struct FormsClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    token: RwLock<Option<String>>,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthFailure {
    message: String,
    code: AuthErrorCode,
    redirect_to: Option<String>,
}

impl FormsClient {
    /// Client against `base_url` with no credentials
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Url::parse(&config.base_url)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let agent = header::HeaderValue::from_str(&format!("formsmith-rust/{}", VERSION))
            .map_err(|e| ClientError::Config(e.to_string()))?;
        headers.insert(header::USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let token = RwLock::new(config.token.clone());
        Ok(Self {
            inner: Arc::new(ClientInner { config, token, http }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.inner.token.write() = token;
    }

    pub fn token(&self) -> Option<String> {
        self.inner.token.read().clone()
    }

    // =========================================================================
    // Auth
    // =========================================================================

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let auth: AuthResponse = self
            .post("/auth/register", &RegisterRequest { name, email, password })
            .await?;
        self.set_token(Some(auth.token.clone()));
        Ok(auth)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let auth: AuthResponse = self.post("/auth/login", &LoginRequest { email, password }).await?;
        self.set_token(Some(auth.token.clone()));
        Ok(auth)
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.get("/auth/me").await
    }

    // =========================================================================
    // Groups
    // =========================================================================

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.get("/groups").await
    }

    pub async fn create_group(&self, name: &str) -> Result<Group> {
        self.post("/groups", &GroupRequest { name }).await
    }

    pub async fn delete_group(&self, id: &str) -> Result<()> {
        self.delete(&format!("/groups/{}", id)).await
    }

    // =========================================================================
    // Forms
    // =========================================================================

    /// `GET /forms`, optionally only the forms filed in `group_id`
    pub async fn list_forms(&self, group_id: Option<&str>) -> Result<Vec<FormSummary>> {
        match group_id {
            Some(group_id) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("groupId", group_id)
                    .finish();
                self.get(&format!("/forms?{}", query)).await
            }
            None => self.get("/forms").await,
        }
    }

    /// `POST /forms`. The form must already carry its client-generated id.
    pub async fn create_form(&self, form: &Form) -> Result<Form> {
        persisted(self.post("/forms", form).await?)
    }

    pub async fn update_form(&self, id: &str, form: &Form) -> Result<Form> {
        persisted(self.put(&format!("/forms/{}", id), form).await?)
    }

    /// Owner-scoped load for editing
    pub async fn get_form(&self, id: &str) -> Result<Form> {
        persisted(self.get(&format!("/forms/{}", id)).await?)
    }

    /// Public read; the server records a view
    pub async fn view_form(&self, id: &str) -> Result<Form> {
        persisted(self.get(&format!("/forms/{}/view", id)).await?)
    }

    pub async fn submit(&self, id: &str, request: &SubmitRequest) -> Result<SubmissionReceipt> {
        self.post(&format!("/forms/{}/submit", id), request).await
    }

    pub async fn delete_form(&self, id: &str) -> Result<()> {
        self.delete(&format!("/forms/{}", id)).await
    }

    pub async fn rename_form(&self, id: &str, title: &str) -> Result<Form> {
        persisted(self.put(&format!("/forms/{}/rename", id), &RenameRequest { title }).await?)
    }

    pub async fn duplicate_form(&self, id: &str) -> Result<Form> {
        persisted(self.post(&format!("/forms/{}/duplicate", id), &()).await?)
    }

    pub async fn export_form(&self, id: &str) -> Result<FormExport> {
        self.get(&format!("/forms/{}/export", id)).await
    }

    pub async fn share_form(&self, id: &str) -> Result<ShareLink> {
        self.get(&format!("/forms/{}/share", id)).await
    }

    pub async fn list_submissions(&self, id: &str) -> Result<Vec<Submission>> {
        self.get(&format!("/forms/{}/responses", id)).await
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None::<&()>).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    fn url(&self, path: &str) -> Result<Url> {
        let base = self.inner.config.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }

    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.url(path)?;
        // only reads are retried; a repeated write could double-apply
        let attempts = if method == Method::GET { self.inner.config.max_retries + 1 } else { 1 };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(method.clone(), url.clone(), body).await {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(%url, attempt, error = %err, "request failed, retrying");
                    tokio::time::sleep(self.inner.config.retry_delay * attempt).await;
                }
                result => return result,
            }
        }
    }

    async fn send_once<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        debug!(%method, %url, "api request");
        let mut request = self.inner.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status == StatusCode::NO_CONTENT {
            return decode(b"null");
        }

        if status.is_success() {
            if let Ok(Envelope { data: Some(data) }) = serde_json::from_slice::<Envelope<T>>(&bytes) {
                return Ok(data);
            }
            return decode(&bytes);
        }

        if status == StatusCode::UNAUTHORIZED {
            let failure = serde_json::from_slice::<AuthFailure>(&bytes).ok();
            return Err(match failure {
                Some(f) => ClientError::Unauthorized {
                    code: f.code,
                    message: f.message,
                    redirect_to: f.redirect_to.unwrap_or_else(|| DEFAULT_REDIRECT.to_string()),
                },
                None => ClientError::Unauthorized {
                    code: AuthErrorCode::Unknown,
                    message: String::from_utf8_lossy(&bytes).into_owned(),
                    redirect_to: DEFAULT_REDIRECT.to_string(),
                },
            });
        }

        Err(match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
            Ok(e) => ClientError::Api {
                status: status.as_u16(),
                code: e.error.code,
                message: e.error.message,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: "unknown_error".to_string(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            },
        })
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| ClientError::Schema(e.to_string()))
}

/// A form coming back from the server must carry the id it was stored under.
fn persisted(form: Form) -> Result<Form> {
    match form.id.as_deref() {
        Some(id) if !id.is_empty() => Ok(form),
        _ => Err(ClientError::Schema("form in response has no id".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn form_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "groupId": "g1",
            "theme": "light",
            "title": "Contact",
            "description": "",
            "pages": [{"id": "p1", "order": 0, "title": "Page 1", "fields": []}],
            "settings": {}
        })
    }

    async fn client_for(server: &MockServer) -> FormsClient {
        FormsClient::with_config(ClientConfig {
            base_url: format!("{}/api", server.uri()),
            token: Some("tok".into()),
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_form_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/forms"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(json!({"title": "Contact"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true, "data": form_json("f1")})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let mut form = Form::new("Contact", "g1");
        form.id = Some("f1".into());
        let saved = client.create_form(&form).await.unwrap();
        assert_eq!(saved.id.as_deref(), Some("f1"));
    }

    #[tokio::test]
    async fn test_unauthorized_carries_code_and_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/forms/f1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Token expired",
                "code": "TOKEN_EXPIRED",
                "redirectTo": "/login"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.get_form("f1").await.unwrap_err();
        match err {
            ClientError::Unauthorized { code, redirect_to, .. } => {
                assert_eq!(code, AuthErrorCode::TokenExpired);
                assert_eq!(redirect_to, "/login");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_form_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/forms/f1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"pages": "nope"}})))
            .mount(&server)
            .await;

        let err = client_for(&server).await.get_form("f1").await.unwrap_err();
        assert!(matches!(err, ClientError::Schema(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_form_without_id_is_schema_error() {
        let server = MockServer::start().await;
        let mut body = form_json("x");
        body.as_object_mut().unwrap().remove("id");
        Mock::given(method("PUT"))
            .and(path("/api/forms/f1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": body})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .update_form("f1", &Form::new("Contact", "g1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Schema(_)));
    }

    #[tokio::test]
    async fn test_not_found_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/forms/f9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "error": {"code": "not_found", "message": "Form not found"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.delete_form("f9").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_accepts_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/forms/f1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server).await.delete_form("f1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_forms_filters_by_group_on_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/forms"))
            .and(query_param("groupId", "team a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let forms = client_for(&server).await.list_forms(Some("team a")).await.unwrap();
        assert!(forms.is_empty());
    }

    #[tokio::test]
    async fn test_reads_retry_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/forms"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/forms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})))
            .mount(&server)
            .await;

        let forms = client_for(&server).await.list_forms(None).await.unwrap();
        assert!(forms.is_empty());
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "token": "fresh",
                    "user": {"id": "u1", "name": "Ada", "email": "ada@example.com", "createdAt": "2024-01-01T00:00:00Z"}
                }
            })))
            .mount(&server)
            .await;

        let client = FormsClient::new(format!("{}/api", server.uri())).unwrap();
        assert!(client.token().is_none());
        let auth = client.login("ada@example.com", "pw").await.unwrap();
        assert_eq!(auth.user.name, "Ada");
        assert_eq!(client.token().as_deref(), Some("fresh"));
    }
}
