//! Centralized configuration for hubview.
//!
//! Constants live on unit structs in the same style as the rest of the crate;
//! the runtime surface consumed by the controllers is [`AppConfig`], which is
//! built once by the caller and passed down explicitly.

use crate::error::{HubViewError, Result};
use std::time::Duration;
use url::Url;

/// Network-related constants.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const GITHUB_API_BASE: &'static str = "https://api.github.com";
    pub const USER_AGENT: &'static str = "hubview/0.1";
    pub const ACCEPT: &'static str = "application/vnd.github+json";
    pub const MAX_RETRIES: u32 = 3;
    pub const BASE_RETRY_DELAY: Duration = Duration::from_secs(1);
    pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
}

/// Environment variables read by [`AppConfig::from_env`].
pub struct EnvVars;

impl EnvVars {
    pub const ENVIRONMENT: &'static str = "HUBVIEW_ENV";
    pub const API_BASE_URL: &'static str = "HUBVIEW_API_BASE_URL";
    pub const TOKEN: &'static str = "GITHUB_TOKEN";
}

/// Deployment environment, selecting timeout and page size presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    Development,
    Staging,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn request_timeout(&self) -> Duration {
        match self {
            Environment::Development => Duration::from_secs(30),
            Environment::Staging => Duration::from_secs(20),
            Environment::Production => Duration::from_secs(15),
        }
    }

    pub fn max_users_per_page(&self) -> u32 {
        match self {
            Environment::Development => 30,
            Environment::Staging => 25,
            Environment::Production => 20,
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = HubViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(HubViewError::Config {
                message: format!("Unknown environment: {}", other),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime configuration consumed by the client and the controllers.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub api_base_url: Url,
    pub request_timeout: Duration,
    /// Page size, used both for the `since` offset and the `has_more` threshold.
    pub max_users_per_page: u32,
    pub personal_access_token: Option<String>,
}

impl AppConfig {
    /// Preset configuration for an environment.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            api_base_url: default_api_base(),
            request_timeout: environment.request_timeout(),
            max_users_per_page: environment.max_users_per_page(),
            personal_access_token: None,
        }
    }

    /// Build a configuration from `HUBVIEW_ENV`, `HUBVIEW_API_BASE_URL` and
    /// `GITHUB_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let environment = match std::env::var(EnvVars::ENVIRONMENT) {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };

        let mut config = Self::for_environment(environment);

        if let Ok(base) = std::env::var(EnvVars::API_BASE_URL) {
            config = config.with_api_base_url(&base)?;
        }

        if let Ok(token) = std::env::var(EnvVars::TOKEN) {
            config = config.with_token(Some(token));
        }

        Ok(config)
    }

    /// Set the API base URL.
    pub fn with_api_base_url(mut self, base: &str) -> Result<Self> {
        self.api_base_url = Url::parse(base).map_err(|e| HubViewError::Config {
            message: format!("Invalid API base URL '{}': {}", base, e),
        })?;
        Ok(self)
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the page size. Zero is rejected.
    pub fn with_max_users_per_page(mut self, page_size: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(HubViewError::Config {
                message: "max_users_per_page must be greater than zero".to_string(),
            });
        }
        self.max_users_per_page = page_size;
        Ok(self)
    }

    /// Set the personal access token. Empty tokens are treated as absent.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.personal_access_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn is_debug(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Base URL as a string without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_base_url.as_str().trim_end_matches('/')
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

fn default_api_base() -> Url {
    Url::parse(NetworkConfig::GITHUB_API_BASE).expect("GITHUB_API_BASE is a valid URL")
}
