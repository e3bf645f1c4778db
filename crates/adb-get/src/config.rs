use artdatabanken_api::{Credentials, DEFAULT_ROOT_URL};

use crate::error::{CliError, Result};

pub const SPECIES_API_KEY_ENV: &str = "ADB_SPECIES_API_KEY";
pub const OBSERVATIONS_API_KEY_ENV: &str = "ADB_OBSERVATIONS_API_KEY";
pub const ACCESS_TOKEN_ENV: &str = "ADB_ACCESS_TOKEN";
pub const API_ROOT_URL_ENV: &str = "ADB_API_ROOT_URL";

/// Values given on the command line, taking precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub species_api_key: Option<String>,
    pub observations_api_key: Option<String>,
    pub access_token: Option<String>,
    pub api_root: Option<String>,
}

/// Resolved settings, read once at startup
#[derive(Clone)]
pub struct Config {
    pub species_api_key: Option<String>,
    pub observations_api_key: Option<String>,
    pub access_token: Option<String>,
    pub api_root: String,
}

impl Config {
    /// Resolve configuration from the process environment
    pub fn from_env(overrides: ConfigOverrides) -> Self {
        Self::resolve(overrides, |name| std::env::var(name).ok())
    }

    /// Resolve configuration from `lookup`, with `overrides` winning.
    /// Empty values count as unset.
    pub fn resolve(overrides: ConfigOverrides, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |given: Option<String>, env_name: &str| {
            given
                .or_else(|| lookup(env_name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let species_api_key = pick(overrides.species_api_key, SPECIES_API_KEY_ENV);
        let observations_api_key = pick(overrides.observations_api_key, OBSERVATIONS_API_KEY_ENV);
        let access_token = pick(overrides.access_token, ACCESS_TOKEN_ENV);
        let api_root = pick(overrides.api_root, API_ROOT_URL_ENV)
            .unwrap_or_else(|| DEFAULT_ROOT_URL.to_string());

        Self {
            species_api_key,
            observations_api_key,
            access_token,
            api_root,
        }
    }

    pub fn species_credentials(&self) -> Result<Credentials> {
        self.credentials(self.species_api_key.as_deref(), SPECIES_API_KEY_ENV, "--species-api-key")
    }

    pub fn observations_credentials(&self) -> Result<Credentials> {
        self.credentials(
            self.observations_api_key.as_deref(),
            OBSERVATIONS_API_KEY_ENV,
            "--observations-api-key",
        )
    }

    fn credentials(&self, key: Option<&str>, env_name: &str, flag: &str) -> Result<Credentials> {
        let key = key.ok_or_else(|| {
            CliError::Config(format!(
                "environment variable {} not set (or pass {})",
                env_name, flag
            ))
        })?;
        let mut credentials = Credentials::new(key);
        if let Some(token) = &self.access_token {
            credentials = credentials.with_access_token(token.clone());
        }
        Ok(credentials)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("species_api_key", &redact(&self.species_api_key))
            .field("observations_api_key", &redact(&self.observations_api_key))
            .field("access_token", &redact(&self.access_token))
            .field("api_root", &self.api_root)
            .finish()
    }
}
