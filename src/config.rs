use std::{env, fmt, net::SocketAddr, time::Duration};

use reqwest::Url;
use thiserror::Error;

use crate::{
    context::Transport,
    readeck::client::{ArchiveRoute, ClientSettings, DEFAULT_RETRY_BASE_DELAY},
};

const DEFAULT_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_MAX_PAGE_SIZE: usize = 100;
const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_HTTP_PATH: &str = "/mcp";

#[derive(Clone)]
pub struct Config {
    pub api_base: String,
    pub api_token: String,
    pub timeout: Duration,
    pub max_page_size: usize,
    pub verify_tls: bool,
    pub user_agent: String,
    pub archive_routes: Vec<ArchiveRoute>,
    pub transport: Transport,
    pub http_addr: SocketAddr,
    pub http_path: String,
    pub http_auth_token: Option<String>,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("READECK_BASE_URL is required")]
    MissingBaseUrl,
    #[error("READECK_BASE_URL must be an absolute http(s) url")]
    InvalidBaseUrl,
    #[error("READECK_BASE_URL must use https unless pointing to localhost")]
    InsecureBaseUrl,
    #[error("READECK_API_TOKEN is required and must not be empty")]
    MissingApiToken,
    #[error("{0} must be a positive integer")]
    InvalidPositiveInteger(&'static str),
    #[error("{0} must be true or false")]
    InvalidBool(&'static str),
    #[error("READECK_ARCHIVE_ROUTES: {0}")]
    InvalidArchiveRoutes(String),
    #[error("MCP_TRANSPORT must be one of: stdio, http, streamable-http")]
    InvalidTransport,
    #[error("MCP_HTTP_ADDR must be a socket address such as 127.0.0.1:8080")]
    InvalidSocket,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_base", &self.api_base)
            .field("api_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("max_page_size", &self.max_page_size)
            .field("verify_tls", &self.verify_tls)
            .field("user_agent", &self.user_agent)
            .field("archive_routes", &self.archive_routes)
            .field("transport", &self.transport)
            .field("http_addr", &self.http_addr)
            .field("http_path", &self.http_path)
            .field(
                "http_auth_token",
                &self.http_auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_base = api_base_from(read("READECK_BASE_URL").ok_or(ConfigError::MissingBaseUrl)?)?;
        let api_token = read("READECK_API_TOKEN").ok_or(ConfigError::MissingApiToken)?;

        let timeout_seconds = read_positive(read("READECK_TIMEOUT_SECONDS"), "READECK_TIMEOUT_SECONDS")?
            .map_or(DEFAULT_TIMEOUT_SECONDS, |value| value as u64);
        let max_page_size = read_positive(read("READECK_MAX_PAGE_SIZE"), "READECK_MAX_PAGE_SIZE")?
            .unwrap_or(DEFAULT_MAX_PAGE_SIZE);
        let verify_tls = read("READECK_VERIFY_TLS")
            .map(|value| parse_bool(&value).ok_or(ConfigError::InvalidBool("READECK_VERIFY_TLS")))
            .transpose()?
            .unwrap_or(true);
        let user_agent = read("READECK_USER_AGENT")
            .unwrap_or_else(|| format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
        let archive_routes = match read("READECK_ARCHIVE_ROUTES") {
            Some(raw) => parse_csv(&raw)
                .iter()
                .map(|item| item.parse::<ArchiveRoute>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(ConfigError::InvalidArchiveRoutes)?,
            None => ArchiveRoute::DEFAULT_ORDER.to_vec(),
        };

        let transport = match read("MCP_TRANSPORT")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("stdio") => Transport::Stdio,
            Some("http" | "streamable-http") => Transport::Http,
            Some(_) => return Err(ConfigError::InvalidTransport),
        };

        let http_addr = read("MCP_HTTP_ADDR")
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)?;
        let http_path = match read("MCP_HTTP_PATH") {
            Some(path) if path.starts_with('/') => path,
            Some(path) => format!("/{path}"),
            None => DEFAULT_HTTP_PATH.to_string(),
        };

        Ok(Self {
            api_base,
            api_token,
            timeout: Duration::from_secs(timeout_seconds),
            max_page_size,
            verify_tls,
            user_agent,
            archive_routes,
            transport,
            http_addr,
            http_path,
            http_auth_token: read("MCP_HTTP_AUTH_TOKEN"),
            allowed_origins: read("MCP_ALLOWED_ORIGINS")
                .map(|raw| parse_csv(&raw))
                .unwrap_or_default(),
        })
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            api_base: self.api_base.clone(),
            api_token: self.api_token.clone(),
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
            verify_tls: self.verify_tls,
            max_page_size: self.max_page_size,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            archive_routes: self.archive_routes.clone(),
        }
    }
}

/// Validates the instance url and derives the `/api` base from it.
/// Query and fragment are dropped.
fn api_base_from(raw: String) -> Result<String, ConfigError> {
    let mut url = Url::parse(&raw).map_err(|_| ConfigError::InvalidBaseUrl)?;
    url.set_query(None);
    url.set_fragment(None);
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or(ConfigError::InvalidBaseUrl)?
        .to_ascii_lowercase();

    match url.scheme() {
        "https" => {}
        "http" if matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]" | "::1") => {}
        "http" => return Err(ConfigError::InsecureBaseUrl),
        _ => return Err(ConfigError::InvalidBaseUrl),
    }

    Ok(format!("{}/api", url.as_str().trim_end_matches('/')))
}

fn read_positive(raw: Option<String>, key: &'static str) -> Result<Option<usize>, ConfigError> {
    raw.map(|value| {
        value
            .parse::<usize>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidPositiveInteger(key))
    })
    .transpose()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
