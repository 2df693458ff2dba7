//! read configuration from a file or the environment

use crate::errors::Error;

pub const DEFAULT_LOGIN_ROUTE: &str = "/auth/login";
pub const DEFAULT_USER_AGENT: &str = "syntaxly-gateway/0.1.0";

pub enum ConfigLocation {
    File(String),
    Env,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub api_url: String,
    #[serde(default = "default_login_route")]
    pub login_route: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Config {
    pub fn from_values(
        api_url: impl Into<String>,
        login_route: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            login_route: login_route.unwrap_or_else(default_login_route),
            user_agent: user_agent.unwrap_or_else(default_user_agent),
        }
    }

    /// # ENV Vars
    /// * `SYNTAXLY_API_URL` - Base URL of the remote API (required)
    /// * `SYNTAXLY_LOGIN_ROUTE` - Route to navigate to when the session is lost
    /// * `SYNTAXLY_USER_AGENT` - Override for the outbound User-Agent header
    pub fn from_env() -> Result<Self, Error> {
        let api_url = std::env::var("SYNTAXLY_API_URL")
            .map_err(|_| Error::Config("Missing SYNTAXLY_API_URL env var".to_string()))?;
        Ok(Self::from_values(
            api_url,
            std::env::var("SYNTAXLY_LOGIN_ROUTE").ok(),
            std::env::var("SYNTAXLY_USER_AGENT").ok(),
        ))
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Returns the API base with any trailing slash removed, after checking it parses as a URL.
    pub fn api_base(&self) -> Result<String, Error> {
        let trimmed = self.api_url.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::Config("API base URL is empty".to_string()));
        }
        reqwest::Url::parse(trimmed).map_err(|e| {
            Error::Config(format!("Invalid API base URL '{}': {}", self.api_url, e))
        })?;
        Ok(trimmed.to_string())
    }
}

pub fn read_config(loc: ConfigLocation) -> Result<Config, Error> {
    match loc {
        ConfigLocation::File(path) => Config::from_file(path),
        ConfigLocation::Env => Config::from_env(),
    }
}
