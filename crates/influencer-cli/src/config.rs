//! Application settings.
//!
//! [`Settings`] is loaded once at startup and passed down by value.  The
//! CLI layer owns settings; the core crate only ever sees the
//! [`PipelineConfig`] derived from them.
//!
//! # Resolution order (highest priority first)
//!
//! 1. `GEMINI_API_KEY`, then `GOOGLE_API_KEY`, for the generation key
//! 2. `IM_`-prefixed environment variables (a `.env` file is loaded into the
//!    environment by `main` before this runs)
//! 3. Built-in defaults

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use config::{Config, Environment};
use influencer_core::application::{PipelineConfig, PollPolicy, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::cli::Feature;
use crate::error::{CliError, CliResult};

/// Prefix shared by every variable this tool reads.
pub const ENV_PREFIX: &str = "IM";

/// Unprefixed variables accepted for the generation key, in priority order.
pub const GEMINI_KEY_ALIASES: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// A credential whose value never appears in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for handing to an adapter.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether `secret` holds something other than whitespace. Both the
    /// credential checks and `config show` use this rule.
    pub fn is_set(secret: Option<&Secret>) -> bool {
        secret.is_some_and(|secret| !secret.0.trim().is_empty())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Everything the process reads from its environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub env: String,
    pub log_level: String,

    pub gemini_api_key: Option<Secret>,
    pub gemini_model: String,

    pub ig_access_token: Option<Secret>,
    pub ig_user_id: Option<String>,
    pub graph_api_base_url: String,
    pub graph_api_version: String,
    pub meta_app_id: Option<String>,
    pub meta_app_secret: Option<Secret>,

    // Pipeline tuning. Unset values fall back to the core defaults.
    pub max_retries: Option<u32>,
    pub backoff_base_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub backoff_max_ms: Option<u64>,
    pub backoff_jitter: Option<f64>,
    pub max_elapsed_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub poll_max_interval_ms: Option<u64>,
    pub poll_timeout_secs: Option<u64>,
    pub lease_ttl_secs: Option<u64>,
}

impl Settings {
    /// Load from the process environment.
    pub fn from_env() -> CliResult<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> CliResult<Self> {
        let gemini_key = GEMINI_KEY_ALIASES
            .iter()
            .filter_map(|name| vars.get(*name))
            .find(|value| !value.trim().is_empty())
            .cloned();

        let env_source: config::Map<String, String> = vars.into_iter().collect();

        Config::builder()
            .set_default("env", "local")?
            .set_default("log_level", "INFO")?
            .set_default("gemini_model", "gemini-3-pro-image-preview")?
            .set_default("graph_api_base_url", "https://graph.facebook.com")?
            .set_default("graph_api_version", "v21.0")?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .ignore_empty(true)
                    .source(Some(env_source)),
            )
            .set_override_option("gemini_api_key", gemini_key)?
            .build()?
            .try_deserialize()
            .map_err(CliError::from)
    }

    /// Fails unless the generation key is present.
    pub fn require_gemini(&self) -> CliResult<()> {
        if !Secret::is_set(self.gemini_api_key.as_ref()) {
            return Err(CliError::MissingCredentials {
                feature: Feature::Gemini,
                message: "Missing Gemini credentials. Set GEMINI_API_KEY or GOOGLE_API_KEY to \
                          enable generation."
                    .into(),
            });
        }
        Ok(())
    }

    /// Fails unless both the access token and the account id are present.
    pub fn require_instagram(&self) -> CliResult<()> {
        let user_id_set = self
            .ig_user_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if !Secret::is_set(self.ig_access_token.as_ref()) || !user_id_set {
            return Err(CliError::MissingCredentials {
                feature: Feature::Instagram,
                message: "Missing Instagram credentials. Set IM_IG_ACCESS_TOKEN and \
                          IM_IG_USER_ID to enable publishing."
                    .into(),
            });
        }
        Ok(())
    }

    /// Checks the credentials `feature` needs. `All` reports the first gap.
    pub fn require(&self, feature: Feature) -> CliResult<()> {
        match feature {
            Feature::Gemini => self.require_gemini(),
            Feature::Instagram => self.require_instagram(),
            Feature::All => {
                self.require_gemini()?;
                self.require_instagram()
            }
        }
    }

    /// The orchestrator configuration these settings describe.
    pub fn pipeline_config(&self) -> CliResult<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let retry = RetryPolicy {
            max_retries: self.max_retries.unwrap_or(defaults.retry.max_retries),
            base_delay: millis_or(self.backoff_base_ms, defaults.retry.base_delay),
            multiplier: self.backoff_multiplier.unwrap_or(defaults.retry.multiplier),
            max_delay: millis_or(self.backoff_max_ms, defaults.retry.max_delay),
            jitter: self.backoff_jitter.unwrap_or(defaults.retry.jitter),
            max_elapsed: secs_or(self.max_elapsed_secs, defaults.retry.max_elapsed),
        };
        let poll = PollPolicy {
            interval: millis_or(self.poll_interval_ms, defaults.poll.interval),
            multiplier: defaults.poll.multiplier,
            max_interval: millis_or(self.poll_max_interval_ms, defaults.poll.max_interval),
            timeout: secs_or(self.poll_timeout_secs, defaults.poll.timeout),
        };
        let lease_ttl = secs_or(self.lease_ttl_secs, defaults.lease_ttl);

        if retry.multiplier.is_nan() || retry.multiplier < 1.0 {
            return Err(invalid("IM_BACKOFF_MULTIPLIER", "must be at least 1.0"));
        }
        if !(0.0..=1.0).contains(&retry.jitter) {
            return Err(invalid("IM_BACKOFF_JITTER", "must be between 0.0 and 1.0"));
        }
        if retry.max_delay < retry.base_delay {
            return Err(invalid(
                "IM_BACKOFF_MAX_MS",
                "must not be smaller than IM_BACKOFF_BASE_MS",
            ));
        }
        if poll.interval.is_zero() {
            return Err(invalid("IM_POLL_INTERVAL_MS", "must be greater than zero"));
        }
        if poll.max_interval < poll.interval {
            return Err(invalid(
                "IM_POLL_MAX_INTERVAL_MS",
                "must not be smaller than IM_POLL_INTERVAL_MS",
            ));
        }

        let config = PipelineConfig {
            retry,
            poll,
            lease_ttl,
        };
        // The lease is renewed only on persist, so it must cover the longest
        // gap between two writes.
        if config.lease_ttl <= config.unrenewed_window() {
            return Err(invalid(
                "IM_LEASE_TTL_SECS",
                "must exceed IM_POLL_TIMEOUT_SECS plus IM_BACKOFF_MAX_MS",
            ));
        }
        Ok(config)
    }

    /// The displayable subset: secrets become `set` / `missing`.
    pub fn view(&self) -> CliResult<SettingsView> {
        let pipeline = self.pipeline_config()?;
        Ok(SettingsView {
            env: self.env.clone(),
            log_level: self.log_level.clone(),
            gemini_model: self.gemini_model.clone(),
            gemini_api_key: presence(self.gemini_api_key.as_ref()),
            ig_access_token: presence(self.ig_access_token.as_ref()),
            ig_user_id: self.ig_user_id.clone(),
            graph_api_base_url: self.graph_api_base_url.clone(),
            graph_api_version: self.graph_api_version.clone(),
            meta_app_id: self.meta_app_id.clone(),
            meta_app_secret: presence(self.meta_app_secret.as_ref()),
            pipeline: PipelineView::from(&pipeline),
        })
    }
}

/// What `config show` prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsView {
    pub env: String,
    pub log_level: String,
    pub gemini_model: String,
    pub gemini_api_key: &'static str,
    pub ig_access_token: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ig_user_id: Option<String>,
    pub graph_api_base_url: String,
    pub graph_api_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_app_id: Option<String>,
    pub meta_app_secret: &'static str,
    pub pipeline: PipelineView,
}

/// Effective pipeline tuning, in the units the variables use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineView {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_multiplier: f64,
    pub backoff_max_ms: u64,
    pub backoff_jitter: f64,
    pub max_elapsed_secs: u64,
    pub poll_interval_ms: u64,
    pub poll_max_interval_ms: u64,
    pub poll_timeout_secs: u64,
    pub lease_ttl_secs: u64,
}

impl From<&PipelineConfig> for PipelineView {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_retries: config.retry.max_retries,
            backoff_base_ms: as_millis(config.retry.base_delay),
            backoff_multiplier: config.retry.multiplier,
            backoff_max_ms: as_millis(config.retry.max_delay),
            backoff_jitter: config.retry.jitter,
            max_elapsed_secs: config.retry.max_elapsed.as_secs(),
            poll_interval_ms: as_millis(config.poll.interval),
            poll_max_interval_ms: as_millis(config.poll.max_interval),
            poll_timeout_secs: config.poll.timeout.as_secs(),
            lease_ttl_secs: config.lease_ttl.as_secs(),
        }
    }
}

fn presence(secret: Option<&Secret>) -> &'static str {
    if Secret::is_set(secret) {
        "set"
    } else {
        "missing"
    }
}

fn millis_or(value: Option<u64>, default: Duration) -> Duration {
    value.map(Duration::from_millis).unwrap_or(default)
}

fn secs_or(value: Option<u64>, default: Duration) -> Duration {
    value.map(Duration::from_secs).unwrap_or(default)
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn invalid(variable: &str, problem: &str) -> CliError {
    CliError::ConfigError {
        message: format!("{variable} {problem}"),
        source: None,
    }
}
