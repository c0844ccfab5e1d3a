//! Configuration for sessionline clients.
//!
//! Settings live in `sessionline.toml`; every key has a default so an empty
//! file (or no file at all, via [`SessionlineConfig::default`]) is usable
//! against a core on localhost.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sessionline_api::SessionError;

pub const CONFIG_FILE_NAME: &str = "sessionline.toml";

/// Where and how to reach the session core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreConfig {
    pub hosts: Vec<String>,
    /// Name of the environment variable holding the core API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub cdi_version: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["http://127.0.0.1:3567".to_string()],
            api_key_env: None,
            connect_timeout_ms: 2_000,
            request_timeout_ms: 10_000,
            cdi_version: "2.0".to_string(),
        }
    }
}

/// Cookie and header names used to carry the tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieNames {
    pub access_token: String,
    pub refresh_token: String,
    pub id_refresh_token: String,
    pub anti_csrf_header: String,
    pub id_refresh_header: String,
}

impl Default for CookieNames {
    fn default() -> Self {
        Self {
            access_token: "sAccessToken".to_string(),
            refresh_token: "sRefreshToken".to_string(),
            id_refresh_token: "sIdRefreshToken".to_string(),
            anti_csrf_header: "anti-csrf".to_string(),
            id_refresh_header: "id-refresh-token".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionlineConfig {
    pub core: CoreConfig,
    pub cookies: CookieNames,
}

impl SessionlineConfig {
    /// Read the API key from the configured environment variable, if any.
    pub fn api_key(&self) -> Result<Option<String>, SessionError> {
        match &self.core.api_key_env {
            None => Ok(None),
            Some(var) => std::env::var(var)
                .map(Some)
                .map_err(|_| SessionError::Config(format!("missing API key env var {var}"))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    core: RawCore,
    #[serde(default)]
    cookies: CookieNames,
}

#[derive(Debug, Default, Deserialize)]
struct RawCore {
    hosts: Option<RawHosts>,
    api_key_env: Option<String>,
    connect_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    cdi_version: Option<String>,
}

/// Either a list, or one string with `;`-separated hosts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawHosts {
    List(Vec<String>),
    Joined(String),
}

impl RawHosts {
    fn into_vec(self) -> Vec<String> {
        let hosts = match self {
            RawHosts::List(list) => list,
            RawHosts::Joined(joined) => joined.split(';').map(str::to_string).collect(),
        };
        hosts
            .into_iter()
            .map(|h| h.trim().trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
            .collect()
    }
}

pub fn validate_config(config: &SessionlineConfig) -> Result<(), SessionError> {
    if config.core.hosts.is_empty() {
        return Err(SessionError::Config(
            "core.hosts must list at least one host".to_string(),
        ));
    }
    for host in &config.core.hosts {
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(SessionError::Config(format!(
                "core host {host} must start with http:// or https://"
            )));
        }
    }
    if config.core.connect_timeout_ms == 0 || config.core.request_timeout_ms == 0 {
        return Err(SessionError::Config(
            "core timeouts must be greater than zero".to_string(),
        ));
    }
    let names = &config.cookies;
    for (key, value) in [
        ("access_token", &names.access_token),
        ("refresh_token", &names.refresh_token),
        ("id_refresh_token", &names.id_refresh_token),
        ("anti_csrf_header", &names.anti_csrf_header),
        ("id_refresh_header", &names.id_refresh_header),
    ] {
        if value.trim().is_empty() {
            return Err(SessionError::Config(format!("cookies.{key} must not be empty")));
        }
    }
    Ok(())
}

pub fn default_config_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config").join("sessionline")
    } else {
        PathBuf::from(".sessionline")
    }
}

pub fn load_config_from_dir(dir: &Path) -> Result<SessionlineConfig, SessionError> {
    load_config_from_file(&dir.join(CONFIG_FILE_NAME))
}

pub fn load_config_from_file(path: &Path) -> Result<SessionlineConfig, SessionError> {
    let content = fs::read_to_string(path)
        .map_err(|e| SessionError::Config(format!("failed to read {}: {e}", path.display())))?;
    parse_config(&content)
        .map_err(|e| SessionError::Config(format!("{}: {e}", path.display())))
}

/// Parse and validate a TOML document.
pub fn parse_config(content: &str) -> Result<SessionlineConfig, SessionError> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| SessionError::Config(format!("invalid TOML: {e}")))?;

    let defaults = CoreConfig::default();
    let core = CoreConfig {
        hosts: raw.core.hosts.map_or(defaults.hosts, RawHosts::into_vec),
        api_key_env: raw.core.api_key_env.filter(|v| !v.is_empty()),
        connect_timeout_ms: raw
            .core
            .connect_timeout_ms
            .unwrap_or(defaults.connect_timeout_ms),
        request_timeout_ms: raw
            .core
            .request_timeout_ms
            .unwrap_or(defaults.request_timeout_ms),
        cdi_version: raw.core.cdi_version.unwrap_or(defaults.cdi_version),
    };

    let config = SessionlineConfig {
        core,
        cookies: raw.cookies,
    };
    validate_config(&config)?;
    Ok(config)
}

/// Write a default config file into `dir` unless one already exists.
///
/// Returns the path of the config file.
pub fn write_default_config(dir: &Path) -> Result<PathBuf, SessionError> {
    fs::create_dir_all(dir)
        .map_err(|e| SessionError::Config(format!("failed to create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        let body = toml::to_string_pretty(&SessionlineConfig::default())
            .map_err(|e| SessionError::Internal(format!("failed to render config: {e}")))?;
        fs::write(&path, body).map_err(|e| {
            SessionError::Config(format!("failed to write {}: {e}", path.display()))
        })?;
    }
    Ok(path)
}
