use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};

use super::decision_cache::{DecisionCache, DecisionKey};
use super::error::ServiceError;

/// Decision cache shared across replicas through Redis.
#[derive(Clone)]
pub struct RedisDecisionCache {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisDecisionCache {
    pub async fn new(url: &str) -> Result<Self, ServiceError> {
        tracing::info!(url = %url, "Connecting decision cache to Redis");
        let client = Client::open(url)?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            ServiceError::Redis(e)
        })?;

        tracing::info!("Decision cache connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(ServiceError::Redis)
    }
}

#[async_trait]
impl DecisionCache for RedisDecisionCache {
    async fn get(&self, key: &DecisionKey) -> Result<Option<bool>, ServiceError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key.redis_key())
            .query_async(&mut conn)
            .await?;

        decode_decision(key, value.as_deref())
    }

    async fn set_with_ttl(
        &self,
        key: &DecisionKey,
        value: bool,
        ttl_seconds: u64,
    ) -> Result<(), ServiceError> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(key.redis_key())
            .arg(encode_decision(value))
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

fn encode_decision(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn decode_decision(key: &DecisionKey, raw: Option<&str>) -> Result<Option<bool>, ServiceError> {
    match raw {
        None => Ok(None),
        Some("1") => Ok(Some(true)),
        Some("0") => Ok(Some(false)),
        Some(other) => Err(ServiceError::Cache(format!(
            "Unexpected cached decision {:?} for {}",
            other, key
        ))),
    }
}
