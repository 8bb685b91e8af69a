//! CLI Configuration

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const KEYS: [&str; 4] = ["api_url", "token", "default_format", "theme"];

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub default_format: Option<String>,
    pub theme: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot find home directory"))?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".formsmith").join(filename))
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        *self.slot(key)? = Some(value);
        Ok(())
    }

    /// Value for display; the token is masked
    pub fn get(&mut self, key: &str) -> Result<Option<String>> {
        let value = self.slot(key)?.clone();
        Ok(if key == "token" { value.map(|t| mask(&t)) } else { value })
    }

    fn slot(&mut self, key: &str) -> Result<&mut Option<String>> {
        Ok(match key {
            "api_url" => &mut self.api_url,
            "token" => &mut self.token,
            "default_format" => &mut self.default_format,
            "theme" => &mut self.theme,
            _ => bail!("Unknown config key: {} (expected one of {})", key, KEYS.join(", ")),
        })
    }
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(8).collect();
    format!("{}****", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("api_url", "http://localhost:9000/api".into()).unwrap();
        assert_eq!(config.get("api_url").unwrap().as_deref(), Some("http://localhost:9000/api"));
        assert!(config.set("tenant_id", "x".into()).is_err());
    }

    #[test]
    fn test_token_is_masked() {
        let mut config = Config::default();
        config.set("token", "eyJhbGciOiJIUzI1NiJ9.payload.sig".into()).unwrap();
        assert_eq!(config.get("token").unwrap().as_deref(), Some("eyJhbGci****"));
    }

    #[test]
    fn test_toml_round_trip_skips_unset() {
        let config = Config { theme: Some("dark".into()), ..Default::default() };
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("token"));
        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }
}
