//! Client configuration: credentials, API version and endpoint.
//!
//! # Design
//! Configuration is an explicit value owned by each client rather than
//! process-wide state. Setters validate first and only then assign, so a
//! rejected key or version leaves the previous value in place. The endpoint
//! is always derived from host and version and has no setter of its own.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{KondutoError, Result};

pub const DEFAULT_HOST: &str = "https://api.konduto.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_LEN: usize = 21;

/// Which Konduto environment a key belongs to, read from its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Test,
    Production,
}

/// A validated API key. `Debug` never prints the secret part.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn parse(key: &str) -> Result<Self> {
        if key.chars().count() != API_KEY_LEN {
            return Err(KondutoError::InvalidApiKey);
        }
        match key.chars().next() {
            Some('T' | 'P') => Ok(Self(key.to_string())),
            _ => Err(KondutoError::InvalidApiKey),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn environment(&self) -> Environment {
        if self.0.starts_with('T') {
            Environment::Test
        } else {
            Environment::Production
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({:?})", self.environment())
    }
}

impl FromStr for ApiKey {
    type Err = KondutoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Supported API versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    V1,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 1] = [ApiVersion::V1];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = KondutoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| KondutoError::InvalidVersion(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    api_key: ApiKey,
    version: ApiVersion,
    host: String,
    timeout: Duration,
}

impl Config {
    pub fn new(api_key: &str) -> Result<Self> {
        Ok(Self {
            api_key: ApiKey::parse(api_key)?,
            version: ApiVersion::default(),
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Load from `KONDUTO_API_KEY` (required), `KONDUTO_API_VERSION`,
    /// `KONDUTO_HOST` and `KONDUTO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let key = lookup("KONDUTO_API_KEY").ok_or(KondutoError::InvalidApiKey)?;
        let mut config = Self::new(&key)?;
        if let Some(version) = lookup("KONDUTO_API_VERSION") {
            config.set_version(&version)?;
        }
        if let Some(host) = lookup("KONDUTO_HOST") {
            config = config.with_host(&host);
        }
        if let Some(secs) = lookup("KONDUTO_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                KondutoError::Config(format!("KONDUTO_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_version(mut self, version: ApiVersion) -> Self {
        self.version = version;
        self
    }

    /// Point the client at another host, e.g. a local mock server.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn set_api_key(&mut self, key: &str) -> Result<()> {
        self.api_key = ApiKey::parse(key)?;
        Ok(())
    }

    pub fn set_version(&mut self, version: &str) -> Result<()> {
        self.version = version.parse()?;
        Ok(())
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Base URL every request path is appended to.
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.host, self.version)
    }
}
