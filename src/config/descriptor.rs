//! Connection descriptors.
//!
//! A descriptor names everything needed to open a connection: the SQL dialect
//! the connection speaks plus host, credentials, database name and charset.
//! Descriptors deserialize straight out of the TOML settings file and can
//! also be assembled from environment variables:
//! - `KATYDID_DB_DIALECT`: SQL dialect (mysql, sqlite)
//! - `KATYDID_DB_HOST`: server hostname
//! - `KATYDID_DB_NAME`: database name (file path for sqlite)
//! - `KATYDID_DB_PORT`: port (optional)
//! - `KATYDID_DB_USERNAME` / `KATYDID_DB_PASSWORD`: credentials (optional)
//! - `KATYDID_DB_CHARSET`: connection charset (optional)
//! - `KATYDID_DB_DSN`: explicit data source path, overrides the name

use std::env;

use serde::Deserialize;

use crate::sql::dialect::Dialect;

/// Error type for descriptor construction.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unknown dialect: {0}. Supported: mysql, sqlite")]
    UnknownDialect(String),

    #[error("Invalid descriptor: {0}")]
    InvalidConfig(String),
}

pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Connection descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Descriptor {
    /// Dialect the rendered SQL targets. MySQL unless stated otherwise.
    pub dialect: Dialect,
    /// Server hostname.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// Username.
    pub username: Option<String>,
    /// Password. Never echoed by [`Descriptor::connection_string`].
    pub password: Option<String>,
    /// Database name; doubles as the file path for file-backed databases.
    pub dbname: Option<String>,
    /// Connection charset.
    pub charset: Option<String>,
    /// Explicit data source path; takes precedence over `dbname`.
    pub dsn: Option<String>,
}

impl Descriptor {
    /// Descriptor for a throwaway in-memory database.
    pub fn in_memory() -> Self {
        Descriptor {
            dialect: Dialect::Sqlite,
            ..Descriptor::default()
        }
    }

    /// Descriptor for a file-backed database at `path`.
    pub fn file(path: impl Into<String>) -> Self {
        Descriptor {
            dialect: Dialect::Sqlite,
            dsn: Some(path.into()),
            ..Descriptor::default()
        }
    }

    /// Assemble a descriptor from `KATYDID_DB_*` environment variables.
    ///
    /// Only the dialect is required; everything else stays unset when the
    /// matching variable is absent.
    pub fn from_env() -> DescriptorResult<Self> {
        let dialect_str = env::var("KATYDID_DB_DIALECT")
            .map_err(|_| DescriptorError::MissingEnvVar("KATYDID_DB_DIALECT".to_string()))?;
        let dialect = Dialect::parse(&dialect_str)
            .ok_or_else(|| DescriptorError::UnknownDialect(dialect_str.clone()))?;

        let port = match env::var("KATYDID_DB_PORT") {
            Ok(raw) => Some(raw.parse().map_err(|_| {
                DescriptorError::InvalidConfig(format!(
                    "KATYDID_DB_PORT must be a port number, got '{}'",
                    raw
                ))
            })?),
            Err(_) => None,
        };

        Ok(Descriptor {
            dialect,
            host: env::var("KATYDID_DB_HOST").ok(),
            port,
            username: env::var("KATYDID_DB_USERNAME").ok(),
            password: env::var("KATYDID_DB_PASSWORD").ok(),
            dbname: env::var("KATYDID_DB_NAME").ok(),
            charset: env::var("KATYDID_DB_CHARSET").ok(),
            dsn: env::var("KATYDID_DB_DSN").ok(),
        })
    }

    /// The path the driver opens: the DSN when present, else the database
    /// name, else an in-memory database.
    pub fn database_path(&self) -> &str {
        self.dsn
            .as_deref()
            .or(self.dbname.as_deref())
            .unwrap_or(":memory:")
    }

    /// Human-readable connection identity with credentials stripped. Safe
    /// for logs and error messages.
    pub fn connection_string(&self) -> String {
        if let Some(dsn) = &self.dsn {
            return format!("{}:{}", self.dialect, dsn);
        }

        let mut out = format!("{}://", self.dialect);
        if let Some(host) = &self.host {
            out.push_str(host);
            if let Some(port) = self.port {
                out.push_str(&format!(":{}", port));
            }
        }
        if let Some(dbname) = &self.dbname {
            out.push('/');
            out.push_str(dbname);
        }
        if let Some(charset) = &self.charset {
            out.push_str(&format!("?charset={}", charset));
        }
        out
    }
}
