//! Transport configuration.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Hard upper bound on how long any request may take.
pub const TIMEOUT_CEILING: Duration = Duration::from_millis(30_000);

/// Where the user is sent when the session is invalidated.
pub const DEFAULT_LOGIN_REDIRECT: &str = "/login";

/// Trailing path segments identifying a login call.
pub const DEFAULT_LOGIN_PATHS: [&str; 2] = ["/auth/login", "/user/v1/login"];

pub const API_URL_ENV: &str = "WEKNORA_API_URL";
pub const TIMEOUT_MS_ENV: &str = "WEKNORA_TIMEOUT_MS";
pub const LOGIN_PATH_ENV: &str = "WEKNORA_LOGIN_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("failed to build HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Configuration shared by every request of one [`crate::HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
    login_paths: Vec<String>,
    login_redirect: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: TIMEOUT_CEILING,
            login_paths: DEFAULT_LOGIN_PATHS.iter().map(|p| p.to_string()).collect(),
            login_redirect: DEFAULT_LOGIN_REDIRECT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Configuration for `base_url` with every other setting at its default.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        validate_base_url(API_URL_ENV, &base_url)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        })
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset or empty values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = match get(API_URL_ENV) {
            Some(url) => Self::new(url)?,
            None => Self::default(),
        };

        if let Some(raw) = get(TIMEOUT_MS_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                var: TIMEOUT_MS_ENV,
                reason: format!("{raw:?}: {e}"),
            })?;
            if millis == 0 {
                return Err(ConfigError::Invalid {
                    var: TIMEOUT_MS_ENV,
                    reason: "must be greater than zero".to_string(),
                });
            }
            config = config.with_timeout(Duration::from_millis(millis));
        }

        if let Some(path) = get(LOGIN_PATH_ENV) {
            config = config.with_login_redirect(path);
        }

        Ok(config)
    }

    /// Set the request timeout; values above [`TIMEOUT_CEILING`] are clamped.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.min(TIMEOUT_CEILING);
        self
    }

    pub fn with_login_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.login_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.login_redirect = path.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn login_paths(&self) -> &[String] {
        &self.login_paths
    }

    pub fn login_redirect(&self) -> &str {
        &self.login_redirect
    }

    /// Absolute URL for `path`. Absolute inputs are passed through.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn validate_base_url(var: &'static str, url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("{url:?}: {e}"),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            var,
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout(), TIMEOUT_CEILING);
        assert_eq!(config.login_redirect(), "/login");
    }

    #[test]
    fn env_values_override_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_ENV, "https://kb.example.com/"),
            (TIMEOUT_MS_ENV, "5000"),
            (LOGIN_PATH_ENV, "/signin"),
        ]))
        .unwrap();

        assert_eq!(config.base_url(), "https://kb.example.com");
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(config.login_redirect(), "/signin");
    }

    #[test]
    fn timeout_is_clamped_to_ceiling() {
        let config = ClientConfig::from_lookup(lookup(&[(TIMEOUT_MS_ENV, "120000")])).unwrap();
        assert_eq!(config.timeout(), TIMEOUT_CEILING);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(TIMEOUT_MS_ENV, "soon")])),
            Err(ConfigError::Invalid { var: TIMEOUT_MS_ENV, .. })
        ));
        assert!(matches!(
            ClientConfig::new("ftp://example.com"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn url_for_joins_relative_paths() {
        let config = ClientConfig::new("http://localhost:9000/").unwrap();
        assert_eq!(config.url_for("/api/v1/auth/me"), "http://localhost:9000/api/v1/auth/me");
        assert_eq!(config.url_for("health"), "http://localhost:9000/health");
        assert_eq!(config.url_for("https://other/x"), "https://other/x");
    }
}
