//! Connection settings for the PostgreSQL catalog client

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::catalog::{CatalogError, CatalogResult};

/// Environment variable holding the connection string
pub const DATABASE_URL_ENV: &str = "POSTGRES_URL";

/// Accepted TLS modes. Plaintext connections are not offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslRequirement {
    #[default]
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslRequirement {
    pub(crate) const fn to_pg(self) -> PgSslMode {
        match self {
            Self::Require => PgSslMode::Require,
            Self::VerifyCa => PgSslMode::VerifyCa,
            Self::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

impl FromStr for SslRequirement {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            "disable" | "allow" | "prefer" => Err(CatalogError::Config(format!(
                "ssl mode '{s}' is not allowed, connections must use TLS"
            ))),
            other => Err(CatalogError::Config(format!("unknown ssl mode '{other}'"))),
        }
    }
}

impl fmt::Display for SslRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Require => "require",
            Self::VerifyCa => "verify-ca",
            Self::VerifyFull => "verify-full",
        })
    }
}

/// Pool and connection settings.
///
/// Defaults: 10 connections, 20 s idle timeout, 10 s connect timeout, TLS required.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    pub ssl: SslRequirement,
}

impl DatabaseConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(20);
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            ssl: SslRequirement::default(),
        }
    }

    /// Read the connection string from [`DATABASE_URL_ENV`]
    pub fn from_env() -> CatalogResult<Self> {
        match std::env::var(DATABASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Ok(Self::new(url)),
            _ => Err(CatalogError::Config(format!(
                "{DATABASE_URL_ENV} is not set"
            ))),
        }
    }

    /// Connection string with the password masked, for logs
    pub fn redacted_url(&self) -> String {
        redact_password(&self.url)
    }

    /// Parse the URL and force the configured TLS mode onto it
    pub(crate) fn connect_options(&self) -> CatalogResult<PgConnectOptions> {
        let options = PgConnectOptions::from_str(&self.url).map_err(|e| {
            CatalogError::Config(format!(
                "invalid connection string '{}': {e}",
                self.redacted_url()
            ))
        })?;
        Ok(options.ssl_mode(self.ssl.to_pg()))
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.redacted_url())
            .field("max_connections", &self.max_connections)
            .field("idle_timeout", &self.idle_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("ssl", &self.ssl)
            .finish()
    }
}

fn redact_password(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return url.to_string();
    };
    let authority_end = url[scheme_end..]
        .find('/')
        .map_or(url.len(), |i| scheme_end + i);
    let Some(at) = url[scheme_end..authority_end].rfind('@').map(|i| scheme_end + i) else {
        return url.to_string();
    };
    match url[scheme_end..at].find(':').map(|i| scheme_end + i) {
        Some(colon) => format!("{}:***{}", &url[..colon], &url[at..]),
        None => url.to_string(),
    }
}
