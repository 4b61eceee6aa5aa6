pub mod authz;
pub mod config;
pub mod models;
pub mod services;

use service_core::error::AppError;
use service_core::observability::init_tracing;

use crate::authz::{Authorizer, Stores};
use crate::config::EngineConfig;

/// Load configuration from the environment, install tracing and build an
/// authorizer over `stores`.
pub async fn bootstrap(stores: Stores) -> Result<(EngineConfig, Authorizer), AppError> {
    let config = EngineConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level, config.common.log_format)?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        instance = %config.common.instance_id,
        "Starting permission engine"
    );

    let authorizer = Authorizer::from_config(&config, stores).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build authorizer");
        AppError::from(e)
    })?;

    Ok((config, authorizer))
}
