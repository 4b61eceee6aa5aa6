use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default lifetime of a cached worker-to-job assignment decision.
pub const DEFAULT_WORKER_JOB_TTL_SECONDS: u64 = 60 * 60;

/// Upper bound on that lifetime: one year, well inside Redis' `EX` range.
pub const MAX_WORKER_JOB_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub cache: CacheConfig,
    pub sink: SinkKind,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: Option<String>,
    pub worker_job_ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

/// Where decision events go.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Tracing,
    Metrics,
    None,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: None,
            worker_job_ttl_seconds: DEFAULT_WORKER_JOB_TTL_SECONDS,
            sweep_interval_seconds: 300,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = EngineConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("permission-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            cache: CacheConfig {
                backend: get_env("DECISION_CACHE_BACKEND", Some("memory"), false)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
                redis_url: env::var("REDIS_URL").ok().filter(|u| !u.is_empty()),
                worker_job_ttl_seconds: parse_u64(
                    "WORKER_JOB_CACHE_TTL_SECONDS",
                    &get_env(
                        "WORKER_JOB_CACHE_TTL_SECONDS",
                        Some(&DEFAULT_WORKER_JOB_TTL_SECONDS.to_string()),
                        false,
                    )?,
                )?,
                sweep_interval_seconds: parse_u64(
                    "DECISION_CACHE_SWEEP_SECONDS",
                    &get_env("DECISION_CACHE_SWEEP_SECONDS", Some("300"), false)?,
                )?,
            },
            sink: get_env("DECISION_SINK", Some("tracing"), false)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.cache.worker_job_ttl_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "WORKER_JOB_CACHE_TTL_SECONDS must be positive"
            )));
        }

        if self.cache.worker_job_ttl_seconds > MAX_WORKER_JOB_TTL_SECONDS {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "WORKER_JOB_CACHE_TTL_SECONDS must not exceed {}",
                MAX_WORKER_JOB_TTL_SECONDS
            )));
        }

        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "REDIS_URL is required when DECISION_CACHE_BACKEND is redis"
            )));
        }

        // A single process cannot share its memory cache with other replicas.
        if self.environment == Environment::Prod && self.cache.backend == CacheBackend::Memory {
            tracing::warn!("In-memory decision cache in production is not shared across replicas");
        }

        Ok(())
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, AppError> {
    value.parse().map_err(|e: std::num::ParseIntError| {
        AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e))
    })
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            _ => Err(format!("Invalid decision cache backend: {}", s)),
        }
    }
}

impl std::str::FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tracing" | "log" => Ok(SinkKind::Tracing),
            "metrics" => Ok(SinkKind::Metrics),
            "none" | "off" => Ok(SinkKind::None),
            _ => Err(format!("Invalid decision sink: {}", s)),
        }
    }
}
