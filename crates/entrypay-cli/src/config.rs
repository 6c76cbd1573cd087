//! Settings
//!
//! Read from `<work_dir>/config.toml`, then `ENTRYPAY_*` environment
//! variables, then command line flags.

use std::path::Path;

use anyhow::{Context, Result};
use entrypay::{ResolverOptions, UnknownStatusPolicy};
use serde::{Deserialize, Serialize};

/// Default backend
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";
/// Default session name
pub const DEFAULT_SESSION: &str = "default";
/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Environment variable prefix
pub const ENV_PREFIX: &str = "ENTRYPAY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub provider: String,
    pub auth_token: Option<String>,
    pub session: String,
    pub timeout_secs: u64,
    pub use_stored_transaction: bool,
    pub unknown_status_policy: UnknownStatusPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            provider: entrypay::client::DEFAULT_PROVIDER.to_string(),
            auth_token: None,
            session: DEFAULT_SESSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            use_stored_transaction: false,
            unknown_status_policy: UnknownStatusPolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from `config_file` (optional) and the environment
    pub fn new(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings: Settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Could not read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        Ok(settings)
    }

    /// Resolver options configured for this session
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            use_stored_transaction: self.use_stored_transaction,
            unknown_status_policy: self.unknown_status_policy,
        }
    }
}
