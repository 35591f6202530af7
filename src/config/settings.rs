//! TOML-based configuration.
//!
//! Supports a config file (katydid.toml) with environment variable expansion
//! in descriptor string fields.
//!
//! Example configuration:
//! ```toml
//! [connections.main]
//! dialect = "mysql"
//! host = "localhost"
//! username = "app"
//! password = "${DB_PASSWORD}"
//! dbname = "robots"
//!
//! [connections.reporting]
//! dialect = "sqlite"
//! dsn = "./data/reports.db"
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::descriptor::Descriptor;

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

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Named connection descriptors.
    #[serde(default)]
    pub connections: HashMap<String, Descriptor>,
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
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `KATYDID_CONFIG`
    /// 2. `./katydid.toml`
    /// 3. `~/.config/katydid/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("KATYDID_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("katydid.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("katydid").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // No config file anywhere: empty settings.
        Ok(Settings::default())
    }

    /// Get a descriptor by name, with environment variables expanded in its
    /// string fields.
    pub fn descriptor(&self, name: &str) -> Result<Descriptor, SettingsError> {
        let raw = self
            .connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))?;
        resolve_descriptor(raw)
    }

    /// The default descriptor: the one named "default" when present,
    /// otherwise any single configured connection.
    pub fn default_descriptor(&self) -> Option<(&str, &Descriptor)> {
        if let Some(descriptor) = self.connections.get("default") {
            return Some(("default", descriptor));
        }
        self.connections.iter().next().map(|(k, v)| (k.as_str(), v))
    }
}

/// Expand env vars in every string field of a descriptor.
fn resolve_descriptor(raw: &Descriptor) -> Result<Descriptor, SettingsError> {
    let expand_opt = |field: &Option<String>| -> Result<Option<String>, SettingsError> {
        field.as_deref().map(expand_env_vars).transpose()
    };

    Ok(Descriptor {
        dialect: raw.dialect,
        host: expand_opt(&raw.host)?,
        port: raw.port,
        username: expand_opt(&raw.username)?,
        password: expand_opt(&raw.password)?,
        dbname: expand_opt(&raw.dbname)?,
        charset: expand_opt(&raw.charset)?,
        dsn: expand_opt(&raw.dsn)?,
    })
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            // Check for ${VAR} or $VAR
            if chars.peek() == Some(&'{') {
                chars.next(); // consume '{'
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '}' {
                        chars.next(); // consume '}'
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            } else {
                // $VAR (ends at non-alphanumeric/underscore)
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        var_name.push(chars.next().unwrap());
                    } else {
                        break;
                    }
                }
                if var_name.is_empty() {
                    // Just a lone $, keep it
                    result.push('$');
                } else {
                    let value = env::var(&var_name)
                        .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                    result.push_str(&value);
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}
