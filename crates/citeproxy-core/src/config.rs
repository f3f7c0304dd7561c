//! Proxy configuration loaded once at startup.
//!
//! Values come from the process environment (optionally seeded from `.env` by the
//! gateway). The resulting [`ProxyConfig`] is immutable and shared via `Arc`.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::instructions::{
    FixedInstructions, InstructionPolicy, LanguageInstructions, NoInstructions,
};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 800;
/// 450 checks at 800 ms is six minutes of waiting.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 450;
pub const DEFAULT_CITATION_CONCURRENCY: usize = 8;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Proxy configuration.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | OPENAI_API_KEY | required | Bearer credential for the assistant API. |
/// | ASSISTANT_ID | required | Assistant that answers every run. |
/// | PORT | 3000 | Listening port. |
/// | CITEPROXY_BIND | 0.0.0.0 | Listening address. |
/// | OPENAI_API_BASE | https://api.openai.com/v1 | Upstream base URL. |
/// | CITEPROXY_POLL_INTERVAL_MS | 800 | Wait between run status checks. |
/// | CITEPROXY_MAX_POLL_ATTEMPTS | 450 | Status checks before giving up (min 1). |
/// | CITEPROXY_CITATION_CONCURRENCY | 8 | Parallel citation lookups (min 1). |
/// | CITEPROXY_HTTP_TIMEOUT_SECS | 60 | Per-request upstream timeout. |
/// | CITEPROXY_STATIC_DIR | . | Directory served for non-API paths. |
/// | CITEPROXY_INSTRUCTIONS | unset | Fixed run instructions. |
/// | CITEPROXY_INSTRUCTIONS_EN / CITEPROXY_INSTRUCTIONS_SV | unset | Per-language run instructions. |
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub api_key: String,
    pub assistant_id: String,
    pub api_base: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub citation_concurrency: usize,
    pub http_timeout: Duration,
    pub static_dir: PathBuf,
    pub instructions: InstructionSource,
}

/// Where run instructions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionSource {
    None,
    Fixed(String),
    ByLanguage { english: String, swedish: String },
}

impl ProxyConfig {
    /// Minimal config with defaults for everything but the credentials.
    pub fn new(api_key: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            assistant_id: assistant_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            citation_concurrency: DEFAULT_CITATION_CONCURRENCY,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            static_dir: PathBuf::from("."),
            instructions: InstructionSource::None,
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let assistant_id = get("ASSISTANT_ID").ok_or(ConfigError::Missing("ASSISTANT_ID"))?;
        let mut config = Self::new(api_key, assistant_id);

        if let Some(base) = get("OPENAI_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("CITEPROXY_BIND") {
            config.bind_addr = parse("CITEPROXY_BIND", v)?;
        }
        if let Some(v) = get("PORT") {
            config.port = parse("PORT", v)?;
        }
        if let Some(v) = get("CITEPROXY_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse("CITEPROXY_POLL_INTERVAL_MS", v)?);
        }
        if let Some(v) = get("CITEPROXY_MAX_POLL_ATTEMPTS") {
            config.max_poll_attempts = parse::<u32>("CITEPROXY_MAX_POLL_ATTEMPTS", v)?.max(1);
        }
        if let Some(v) = get("CITEPROXY_CITATION_CONCURRENCY") {
            config.citation_concurrency =
                parse::<usize>("CITEPROXY_CITATION_CONCURRENCY", v)?.max(1);
        }
        if let Some(v) = get("CITEPROXY_HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(parse("CITEPROXY_HTTP_TIMEOUT_SECS", v)?);
        }
        if let Some(v) = get("CITEPROXY_STATIC_DIR") {
            config.static_dir = PathBuf::from(v);
        }

        config.instructions = match (
            get("CITEPROXY_INSTRUCTIONS_EN"),
            get("CITEPROXY_INSTRUCTIONS_SV"),
            get("CITEPROXY_INSTRUCTIONS"),
        ) {
            (Some(english), Some(swedish), _) => InstructionSource::ByLanguage { english, swedish },
            (_, _, Some(fixed)) => InstructionSource::Fixed(fixed),
            _ => InstructionSource::None,
        };

        Ok(config)
    }

    /// Instruction policy matching [`ProxyConfig::instructions`].
    pub fn instruction_policy(&self) -> Box<dyn InstructionPolicy> {
        match &self.instructions {
            InstructionSource::None => Box::new(NoInstructions),
            InstructionSource::Fixed(text) => Box::new(FixedInstructions::new(text.clone())),
            InstructionSource::ByLanguage { english, swedish } => {
                Box::new(LanguageInstructions::new(english.clone(), swedish.clone()))
            }
        }
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { var, value })
}
