//! API Configuration

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listen address
    pub bind_addr: String,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    /// Token lifetime
    pub token_ttl_hours: i64,
    /// Where clients are sent after a 401
    pub redirect_to: String,
    /// Origin of the public form pages, used for share links
    pub public_base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            jwt_secret: "formsmith-dev-secret-change-in-production".into(),
            token_ttl_hours: 24,
            redirect_to: "/login".into(),
            public_base_url: "http://localhost:5173".into(),
        }
    }
}

impl ApiConfig {
    /// Load from file
    pub fn load(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// `FORMSMITH_CONFIG` file if set, then `FORMSMITH_BIND` /
    /// `FORMSMITH_JWT_SECRET` overrides.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("FORMSMITH_CONFIG") {
            Ok(path) => Self::load(&path).unwrap_or_else(|e| {
                tracing::warn!(%path, error = %e, "config not readable, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        if let Ok(bind) = std::env::var("FORMSMITH_BIND") {
            config.bind_addr = bind;
        }
        if let Ok(secret) = std::env::var("FORMSMITH_JWT_SECRET") {
            config.jwt_secret = secret;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ApiConfig = serde_json::from_str(r#"{"bind_addr": "127.0.0.1:9000"}"#).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.redirect_to, "/login");
    }
}
