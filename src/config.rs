//! Client configuration. Values are public endpoints and tunables; tokens
//! never live here.

use crate::error::{Error, Result};
use std::{env, path::PathBuf, time::Duration};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
/// Default request timeout applied by the transport.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const TOKEN_FILE_NAME: &str = "tokens.json";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_base_url: String,
    timeout: Duration,
    storage_path: PathBuf,
    user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL.to_string())
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(api_base_url: String) -> Self {
        Self {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            storage_path: default_storage_path(),
            user_agent: crate::APP_USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_storage_path(mut self, path: PathBuf) -> Self {
        self.storage_path = path;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn storage_path(&self) -> &PathBuf {
        &self.storage_path
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Checks the base URL and timeout.
    /// # Errors
    /// Returns [`Error::Config`] for a non-http(s) base URL or a zero timeout.
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.api_base_url)?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Error::Config(format!(
                    "unsupported scheme {scheme}, expected http or https"
                )))
            }
        }

        if url.host().is_none() {
            return Err(Error::Config("API base URL has no host".to_string()));
        }

        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".to_string()));
        }

        Ok(url)
    }

    /// Joins `path` onto the base URL, keeping any base path prefix.
    /// # Errors
    /// Returns [`Error::Config`] if the result is not a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&build_url_with_base(&self.api_base_url, path))?)
    }
}

fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// `$XDG_CONFIG_HOME/authkeeper/tokens.json`, then `$HOME/.config/...`,
/// then a path relative to the working directory.
#[must_use]
pub fn default_storage_path() -> PathBuf {
    let dir = env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("HOME")
                .filter(|value| !value.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        });

    match dir {
        Some(dir) => dir.join(env!("CARGO_PKG_NAME")).join(TOKEN_FILE_NAME),
        None => PathBuf::from(format!(".{}", env!("CARGO_PKG_NAME"))).join(TOKEN_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path() {
        let config = ClientConfig::new("http://localhost:8000/api/".to_string());
        assert_eq!(
            config.endpoint("/auth/login/").unwrap().as_str(),
            "http://localhost:8000/api/auth/login/"
        );
        assert_eq!(
            config.endpoint("auth/profile/").unwrap().as_str(),
            "http://localhost:8000/api/auth/profile/"
        );
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(matches!(
            ClientConfig::new("ftp://example.com".to_string()).validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ClientConfig::new("not a url".to_string()).validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ClientConfig::default()
                .with_timeout(Duration::ZERO)
                .validate(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(3))
            .with_storage_path(PathBuf::from("/tmp/tokens.json"))
            .with_user_agent("tests/1.0".to_string());
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.storage_path(), &PathBuf::from("/tmp/tokens.json"));
        assert_eq!(config.user_agent(), "tests/1.0");
    }

    #[test]
    fn default_storage_path_prefers_xdg() {
        temp_env::with_vars(
            [
                ("XDG_CONFIG_HOME", Some("/xdg")),
                ("HOME", Some("/home/ana")),
            ],
            || {
                assert_eq!(
                    default_storage_path(),
                    PathBuf::from("/xdg/authkeeper/tokens.json")
                );
            },
        );
        temp_env::with_vars(
            [("XDG_CONFIG_HOME", None::<&str>), ("HOME", Some("/home/ana"))],
            || {
                assert_eq!(
                    default_storage_path(),
                    PathBuf::from("/home/ana/.config/authkeeper/tokens.json")
                );
            },
        );
    }
}
