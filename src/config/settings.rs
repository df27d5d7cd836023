//! TOML-based configuration for graphweave.
//!
//! Supports a config file (graphweave.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [database]
//! dialect = "sqlite"
//! url = "${BLOG_DB}"
//! pool_size = 8
//!
//! [resolver]
//! max_concurrency = 0      # 0 = database.pool_size
//! strict_fields = true
//! allow_raw_order_by = true  # false = plain column lists only
//!
//! [auth]
//! secret = "${jwt_token}"
//! guest_name = "guest"
//! guest_rules = ["guest"]
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::{Identity, GUEST_NAME, GUEST_RULE};
use crate::sql::dialect::Dialect;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GRAPHWEAVE_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub resolver: ResolverSettings,
    pub auth: AuthSettings,
}

/// Database connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQL dialect statements are rendered in.
    pub dialect: Dialect,

    /// Connection URL or file path (supports ${ENV_VAR} expansion).
    pub url: Option<String>,

    /// Connections available to concurrent sub-resolutions.
    pub pool_size: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            url: None,
            pool_size: 4,
        }
    }
}

impl DatabaseSettings {
    /// Get the URL with environment variables expanded.
    pub fn resolved_url(&self) -> Result<Option<String>, SettingsError> {
        self.url.as_deref().map(expand_env_vars).transpose()
    }
}

/// Resolution behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// In-flight statements per request; 0 uses `database.pool_size`.
    pub max_concurrency: usize,

    /// Reject selected fields the schema does not define.
    pub strict_fields: bool,

    /// Pass any `orderBy` string through; `false` accepts plain column lists only.
    pub allow_raw_order_by: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 0,
            strict_fields: true,
            allow_raw_order_by: true,
        }
    }
}

/// Token signing and the guest identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 secret (supports ${ENV_VAR} expansion).
    pub secret: Option<String>,

    pub guest_name: String,

    pub guest_rules: Vec<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: None,
            guest_name: GUEST_NAME.to_string(),
            guest_rules: vec![GUEST_RULE.to_string()],
        }
    }
}

impl AuthSettings {
    /// Secret with environment variables expanded; `None` when unset, empty
    /// or referring to a missing variable.
    pub fn resolved_secret(&self) -> Option<String> {
        let secret = self.secret.as_deref()?;
        match expand_env_vars(secret) {
            Ok(expanded) if !expanded.is_empty() => Some(expanded),
            Ok(_) => None,
            Err(e) => {
                log::warn!("auth secret unavailable: {e}");
                None
            }
        }
    }

    pub fn guest_identity(&self) -> Identity {
        Identity::new(&self.guest_name, self.guest_rules.iter().cloned())
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `GRAPHWEAVE_CONFIG`
    /// 2. `./graphweave.toml`
    /// 3. `~/.config/graphweave/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("graphweave.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("graphweave").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.database.pool_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "database.pool_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Statements a single request may run concurrently.
    pub fn effective_concurrency(&self) -> usize {
        match self.resolver.max_concurrency {
            0 => self.database.pool_size.max(1),
            n => n,
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let name: String = chars.by_ref().take_while(|&ch| ch != '}').collect();
            name
        } else {
            let mut name = String::new();
            // Names start with a letter or underscore, so `$5` stays literal.
            if chars.peek().is_some_and(|&ch| ch.is_alphabetic() || ch == '_') {
                while let Some(&ch) = chars.peek() {
                    if !(ch.is_alphanumeric() || ch == '_') {
                        break;
                    }
                    name.push(ch);
                    chars.next();
                }
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
