use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => AppError::InternalError(e),
            ServiceError::Redis(e) => AppError::InternalError(anyhow::Error::new(e)),
            ServiceError::Cache(e) => AppError::InternalError(anyhow::anyhow!(e)),
            ServiceError::Config(e) => AppError::ConfigError(anyhow::anyhow!(e)),
        }
    }
}
