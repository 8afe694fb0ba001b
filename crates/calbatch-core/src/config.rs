use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Largest page the Calendar API accepts for `events.list`.
pub const MAX_PAGE_SIZE: u32 = 2500;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// OAuth client secrets and token cache
    #[serde(default)]
    pub auth: AuthConfig,

    /// Calendar API endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Selector parsing
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Copy command settings
    #[serde(default)]
    pub copy: CopyConfig,

    /// Batch delete/copy failure policy
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Google OAuth client secrets file ("installed" or "web" application)
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,

    /// Where the access/refresh token pair is cached between runs
    #[serde(default = "default_token_cache_file")]
    pub token_cache_file: PathBuf,

    /// Local port for the OAuth redirect listener
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,

    /// Scopes requested during authorization
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_cache_file() -> PathBuf {
    PathBuf::from("auth_token.json")
}

fn default_callback_port() -> u16 {
    8080
}

fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/calendar".to_string(),
        "https://www.googleapis.com/auth/calendar.readonly".to_string(),
    ]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
            token_cache_file: default_token_cache_file(),
            callback_port: default_callback_port(),
            scopes: default_scopes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Calendar v3 base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `maxResults` sent with every event list page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Treat the word `list` (any case) as "no selector".
    ///
    /// Disable this to select a calendar or event literally named "list".
    #[serde(default = "default_true")]
    pub list_is_wildcard: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            list_is_wildcard: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Provider-managed fields removed from an event before it is re-inserted
    #[serde(default = "default_stripped_fields")]
    pub stripped_fields: Vec<String>,

    /// Number of event colors to cycle through (`colorId` 1..=color_cycle)
    #[serde(default = "default_color_cycle")]
    pub color_cycle: u32,
}

fn default_stripped_fields() -> Vec<String> {
    [
        "created", "creator", "etag", "htmlLink", "iCalUID", "id", "sequence", "updated",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_color_cycle() -> u32 {
    10
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            stripped_fields: default_stripped_fields(),
            color_cycle: default_color_cycle(),
        }
    }
}

/// What a batch delete/copy does when one remote call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first failure and return it
    #[default]
    Abort,
    /// Log the failure, keep going, report a count at the end
    Continue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used and a default file is written there on first run.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                Self::load_from(path)
            }
            None => {
                let Some(config_path) = Self::default_path() else {
                    tracing::debug!("No config directory on this platform, using defaults");
                    return Ok(Self::default());
                };

                if !config_path.exists() {
                    let config = Self::default();
                    if let Err(e) = config.save(&config_path) {
                        tracing::warn!("Could not write default config: {}", e);
                    }
                    return Ok(config);
                }

                Self::load_from(&config_path)
            }
        }
    }

    /// Load and parse a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::NotFound(format!("{}: {}", path.display(), e)))?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api.base_url, "api.base_url", &mut result);

        if self.api.page_size == 0 || self.api.page_size > MAX_PAGE_SIZE {
            result.add_error(
                "api.page_size",
                format!("Page size must be between 1 and {}", MAX_PAGE_SIZE),
            );
        } else if self.api.page_size < 50 {
            result.add_warning(
                "api.page_size",
                "Small page size means many requests for large calendars",
            );
        }

        if self.auth.callback_port == 0 {
            result.add_error("auth.callback_port", "Port cannot be 0");
        }

        if self.auth.scopes.is_empty() {
            result.add_error("auth.scopes", "At least one OAuth scope is required");
        }

        if self.copy.color_cycle == 0 {
            result.add_error("copy.color_cycle", "Color cycle must be at least 1");
        } else if self.copy.color_cycle > 11 {
            result.add_warning(
                "copy.color_cycle",
                "Google Calendar only defines event colors 1 to 11",
            );
        }

        if self.copy.stripped_fields.iter().all(|f| f != "id") {
            result.add_warning(
                "copy.stripped_fields",
                "\"id\" is not stripped; inserting copies will fail with a duplicate id",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteFailed(e.to_string()))?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::WriteFailed(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::WriteFailed(e.to_string()))?;

        tracing::info!("Wrote default config to {}", path.display());
        Ok(())
    }

    /// `~/.config/calbatch/config.toml` on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("calbatch").join("config.toml"))
    }
}
