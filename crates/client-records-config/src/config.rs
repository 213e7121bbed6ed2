// crates/client-records-config/src/config.rs
// ============================================================================
// Module: Client Records Configuration
// Description: Configuration loading and validation for the client records
//              service and form client.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: client-records-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional; omitted keys fall back to built-in defaults.
//! Invalid values fail closed before the service opens its store or binds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use client_records_store_sqlite::SqliteStoreConfig;
use client_records_store_sqlite::SqliteStoreMode;
use client_records_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "client-records.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CLIENT_RECORDS_CONFIG";
/// Environment variable that overrides the bind port.
pub const PORT_ENV_VAR: &str = "PORT";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:3000";
/// Default maximum request body size.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Upper bound for the request body limit.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Default database file.
const DEFAULT_STORE_PATH: &str = "clients.db";
/// Default `SQLite` busy timeout.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Upper bound for the `SQLite` busy timeout.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Default record service URL used by the form client.
const DEFAULT_SERVICE_URL: &str = "http://localhost:3000";
/// Default submission source label.
const DEFAULT_FORM_SOURCE: &str = "Meeting Record Form";
/// Maximum length of a URL setting.
const MAX_URL_LENGTH: usize = 2048;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientRecordsConfig {
    /// Record service settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Durable store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Form client settings.
    #[serde(default)]
    pub form: FormConfig,
}

impl ClientRecordsConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// An explicit path or `CLIENT_RECORDS_CONFIG` must exist. When neither is
    /// given and `client-records.toml` is absent, built-in defaults are used.
    /// `PORT` overrides the bind port after parsing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        let mut config = if !explicit && !resolved.exists() {
            Self::default()
        } else {
            Self::from_file(&resolved)?
        };
        let port = env::var(PORT_ENV_VAR).ok();
        config.apply_port_override(port.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file without validation.
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses configuration from TOML text without validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid config TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Replaces the bind port when a `PORT` value is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the value is not a port number or
    /// the bind address cannot be parsed.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<(), ConfigError> {
        let Some(port) = port.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(());
        };
        let port: u16 =
            port.parse().map_err(|_| ConfigError::Invalid(format!("invalid PORT: {port}")))?;
        let mut addr = self.server.bind_addr()?;
        addr.set_port(port);
        self.server.bind = addr.to_string();
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.logging.validate()?;
        self.form.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Record service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Value of `Access-Control-Allow-Origin`.
    #[serde(default = "default_cors_allow_origin")]
    pub cors_allow_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            cors_allow_origin: default_cors_allow_origin(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.bind)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid("server.max_body_bytes too large".to_string()));
        }
        let origin = self.cors_allow_origin.trim();
        if origin.is_empty() {
            return Err(ConfigError::Invalid(
                "server.cors_allow_origin must be non-empty".to_string(),
            ));
        }
        if origin != "*" && !is_http_url(origin) {
            return Err(ConfigError::Invalid(
                "server.cors_allow_origin must be * or an http(s) origin".to_string(),
            ));
        }
        if !origin.bytes().all(|byte| byte.is_ascii_graphic()) {
            return Err(ConfigError::Invalid(
                "server.cors_allow_origin must be printable ascii".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Durable store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Database file path.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Seed example clients into an empty store on start.
    #[serde(default = "default_true")]
    pub seed_defaults: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            seed_defaults: true,
        }
    }
}

impl StoreConfig {
    /// Builds the `SQLite` store configuration.
    #[must_use]
    pub fn to_sqlite_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
            seed_defaults: self.seed_defaults,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let text = self.path.to_string_lossy();
        if text.trim().is_empty() {
            return Err(ConfigError::Invalid("store.path must be non-empty".to_string()));
        }
        validate_path(&self.path)?;
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid("store.busy_timeout_ms too large".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Default `tracing` filter directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_log_filter(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Form Client
// ============================================================================

/// Form client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormConfig {
    /// Base URL of the record service.
    #[serde(default = "default_service_url")]
    pub service_url: String,
    /// Automation webhook receiving outcome submissions.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// `source` label stamped on every submission.
    #[serde(default = "default_form_source")]
    pub source: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            webhook_url: None,
            source: default_form_source(),
        }
    }
}

impl FormConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_url("form.service_url", &self.service_url)?;
        if let Some(webhook_url) = &self.webhook_url {
            validate_url("form.webhook_url", webhook_url)?;
        }
        if self.source.trim().is_empty() {
            return Err(ConfigError::Invalid("form.source must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag reports whether it was requested
/// explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates an http(s) URL setting.
fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if !is_http_url(trimmed) {
        return Err(ConfigError::Invalid(format!("{field} must be an http(s) url")));
    }
    Ok(())
}

/// Returns true for `http://` or `https://` URLs with a host part.
fn is_http_url(value: &str) -> bool {
    value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty())
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_cors_allow_origin() -> String {
    "*".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

const fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_form_source() -> String {
    DEFAULT_FORM_SOURCE.to_string()
}
