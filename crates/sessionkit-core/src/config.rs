//! Client configuration management.
//!
//! Holds the API base URL the session store talks to, the path the web
//! frontend is served under, and the dev-server settings (listen address,
//! proxy rules, allowed hosts).
//!
//! Configuration is stored at `~/.config/sessionkit/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "sessionkit";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Session tier directory under the cache dir, used without a runtime dir
const SESSION_SUBDIR: &str = "session";

/// Environment variable overriding `api_base`
pub const API_BASE_ENV: &str = "SESSIONKIT_API_BASE";

const DEFAULT_API_BASE: &str = "https://api.nanoproai.shop/api";
const DEFAULT_BASE_PATH: &str = "/web";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevServer {
    pub host: String,
    pub port: u16,
}

impl Default for DevServer {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Forwards requests whose path starts with `prefix` to `target` during development.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRule {
    pub prefix: String,
    pub target: String,
    #[serde(default)]
    pub change_origin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub base_path: String,
    pub dev_server: DevServer,
    pub dev_proxy: Vec<ProxyRule>,
    pub allowed_hosts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            dev_server: DevServer::default(),
            dev_proxy: vec![ProxyRule {
                prefix: "/api".to_string(),
                target: "http://localhost:5000/api".to_string(),
                change_origin: true,
            }],
            allowed_hosts: vec![
                "web.nanoproai.shop".to_string(),
                "api.nanoproai.shop".to_string(),
                "recaptcha.nanoproai.shop".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load from the config directory, falling back to defaults, then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(api_base) = std::env::var(API_BASE_ENV) {
            if !api_base.trim().is_empty() {
                self.api_base = api_base.trim().to_string();
            }
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Directory for the session tier. The runtime dir is cleared when the
    /// login session ends; platforms without one use a private directory
    /// under the cache dir instead of the shared temp dir.
    pub fn session_dir(&self) -> Result<PathBuf> {
        match dirs::runtime_dir() {
            Some(dir) => Ok(dir.join(APP_NAME)),
            None => Ok(self.cache_dir()?.join(SESSION_SUBDIR)),
        }
    }

    /// Join an application route under `base_path`.
    pub fn app_path(&self, route: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        let route = route.trim_start_matches('/');
        format!("{}/{}", base, route)
    }

    /// Rewrite a dev-time request path through the first matching proxy rule.
    pub fn proxy_target(&self, path: &str) -> Option<String> {
        self.dev_proxy.iter().find_map(|rule| {
            let rest = path.strip_prefix(rule.prefix.as_str())?;
            // "/apix" must not match "/api"
            if !rest.is_empty() && !rest.starts_with('/') && !rest.starts_with('?') {
                return None;
            }
            Some(format!("{}{}", rule.target.trim_end_matches('/'), rest))
        })
    }

    /// Whether `host` may reach the dev server.
    pub fn is_allowed_host(&self, host: &str) -> bool {
        let host = host.split(':').next().unwrap_or(host);
        host == "localhost"
            || self
                .allowed_hosts
                .iter()
                .any(|allowed| allowed == "all" || allowed.eq_ignore_ascii_case(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_path, "/web");
        assert_eq!(config.dev_server.port, 3000);
        assert_eq!(config.dev_proxy[0].prefix, "/api");
    }

    #[test]
    fn test_app_path() {
        let config = Config::default();
        assert_eq!(config.app_path("/"), "/web/");
        assert_eq!(config.app_path("/dashboard"), "/web/dashboard");
        assert_eq!(config.app_path("login"), "/web/login");
    }

    #[test]
    fn test_proxy_target() {
        let config = Config::default();
        assert_eq!(
            config.proxy_target("/api/user/me").as_deref(),
            Some("http://localhost:5000/api/user/me")
        );
        assert_eq!(config.proxy_target("/api").as_deref(), Some("http://localhost:5000/api"));
        assert_eq!(
            config.proxy_target("/api?x=1").as_deref(),
            Some("http://localhost:5000/api?x=1")
        );
        assert_eq!(config.proxy_target("/apix/user"), None);
        assert_eq!(config.proxy_target("/web/"), None);
    }

    #[test]
    fn test_allowed_hosts() {
        let config = Config::default();
        assert!(config.is_allowed_host("localhost:3000"));
        assert!(config.is_allowed_host("WEB.nanoproai.shop"));
        assert!(config.is_allowed_host("recaptcha.nanoproai.shop"));
        assert!(!config.is_allowed_host("evil.example.com"));
    }

    #[test]
    fn test_session_dir_is_app_specific() {
        let config = Config::default();
        if let Ok(dir) = config.session_dir() {
            assert!(dir.ends_with(APP_NAME) || dir.ends_with(SESSION_SUBDIR));
        }
    }

    #[test]
    fn test_save_and_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"api_base":"http://localhost:5000/api"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base, "http://localhost:5000/api");
        assert_eq!(config.base_path, "/web");

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
