//! REST backend configuration
//!
//! Configuration is read from `SUPABASE_`-prefixed environment variables:
//!
//! * `SUPABASE_URL` - Project base URL (required)
//! * `SUPABASE_KEY` - Anon key (required)
//! * `SUPABASE_SERVICE_ROLE_KEY` - Service role key, used when requested
//! * `SUPABASE_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! * `SUPABASE_SCHEMA` - PostgREST schema profile (default: the server's)
//! * `SUPABASE_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::warn;

use crate::error::ConfigError;

const PREFIX: &str = "SUPABASE";
const SERVICE_ROLE_PLACEHOLDER: &str = "YOUR_SERVICE_ROLE_KEY_HERE";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Variables as they appear in the environment, before validation
#[derive(Debug, Default, Deserialize)]
struct RawRestConfig {
    url: Option<String>,
    key: Option<String>,
    service_role_key: Option<String>,
    timeout_secs: Option<String>,
    schema: Option<String>,
    log_level: Option<String>,
}

/// Connection settings for the PostgREST backend
#[derive(Clone)]
pub struct RestConfig {
    /// Project base URL without a trailing slash
    pub url: String,
    /// Key sent as `apikey` and bearer token
    pub api_key: String,
    /// Whether `api_key` is the service role key
    pub is_service_role: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// Schema profile sent as `Accept-Profile`/`Content-Profile`
    pub schema: Option<String>,
    /// Log level for `init_tracing`
    pub log_level: String,
}

impl fmt::Debug for RestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("is_service_role", &self.is_service_role)
            .field("timeout", &self.timeout)
            .field("schema", &self.schema)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl RestConfig {
    /// Creates a configuration with default timeout and log level
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            is_service_role: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            schema: None,
            log_level: "info".to_string(),
        }
    }

    /// Sets the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the schema profile
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the log level
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Loads configuration from the process environment
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// With `use_service_role`, the service role key is used when configured;
    /// otherwise the anon key is used and a warning is logged.
    pub fn from_env(use_service_role: bool) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_environment(::config::Environment::with_prefix(PREFIX), use_service_role)
    }

    /// Loads configuration from explicit variables instead of the process environment
    ///
    /// Variable names carry the `SUPABASE_` prefix, as in the environment.
    pub fn from_vars<I, K, V>(vars: I, use_service_role: bool) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self::from_environment(
            ::config::Environment::with_prefix(PREFIX).source(Some(vars)),
            use_service_role,
        )
    }

    fn from_environment(
        environment: ::config::Environment,
        use_service_role: bool,
    ) -> Result<Self, ConfigError> {
        let raw: RawRestConfig = ::config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        Self::resolve(raw, use_service_role)
    }

    fn resolve(raw: RawRestConfig, use_service_role: bool) -> Result<Self, ConfigError> {
        let url = non_empty(raw.url).ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                variable: "SUPABASE_URL",
                message: format!("expected an http(s) URL, got '{}'", url),
            });
        }

        let anon_key = non_empty(raw.key).ok_or(ConfigError::Missing("SUPABASE_KEY"))?;

        let service_role_key = non_empty(raw.service_role_key)
            .filter(|k| k != SERVICE_ROLE_PLACEHOLDER);
        let (api_key, is_service_role) = match (use_service_role, service_role_key) {
            (true, Some(key)) => (key, true),
            (true, None) => {
                warn!("SUPABASE_SERVICE_ROLE_KEY not configured, falling back to anon key");
                (anon_key, false)
            }
            (false, _) => (anon_key, false),
        };

        let timeout_secs = match non_empty(raw.timeout_secs) {
            Some(value) => value.parse::<u64>().map_err(|e| ConfigError::Invalid {
                variable: "SUPABASE_TIMEOUT_SECS",
                message: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let mut config = RestConfig::new(url, api_key)
            .timeout(Duration::from_secs(timeout_secs))
            .log_level(non_empty(raw.log_level).unwrap_or_else(|| "info".to_string()));
        config.is_service_role = is_service_role;
        config.schema = non_empty(raw.schema);
        Ok(config)
    }

    /// Returns the base URL of the REST endpoint
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
