use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::{require_id, AuthzError, CheckContext, Evaluator};
use crate::models::{Consumer, ResourceKind};
use crate::services::{ConsumerStore, GrantPath};

fn parse_id(kind: ResourceKind, id: &str) -> Result<Uuid, AuthzError> {
    let id = require_id(kind, id)?;
    Uuid::parse_str(id)
        .map_err(|_| AuthzError::wrong_request(format!("invalid given {} id {}", kind, id)))
}

async fn load_consumer(
    consumers: &dyn ConsumerStore,
    id: Uuid,
    denial: &str,
) -> Result<Consumer, AuthzError> {
    match consumers.load_consumer_by_id(id).await {
        Ok(Some(consumer)) => Ok(consumer),
        Ok(None) => Err(AuthzError::forbidden(denial)),
        Err(e) => {
            tracing::warn!(error = %e, consumer_id = %id, "Failed to load consumer");
            Err(AuthzError::forbidden(denial))
        }
    }
}

fn same_user(ctx: &CheckContext<'_>, target: &Consumer, denial: String) -> Result<GrantPath, AuthzError> {
    if target.user_id == ctx.consumer.user_id {
        return Ok(GrantPath::IsGranted);
    }
    tracing::debug!(
        consumer_id = %ctx.consumer.id,
        target_consumer_id = %target.id,
        "Consumer belongs to another user"
    );
    Err(AuthzError::forbidden(denial))
}

/// Only consumers of the same user; no role override.
pub struct ConsumerEvaluator {
    consumers: Arc<dyn ConsumerStore>,
}

impl ConsumerEvaluator {
    pub fn new(consumers: Arc<dyn ConsumerStore>) -> Self {
        Self { consumers }
    }
}

#[async_trait]
impl Evaluator for ConsumerEvaluator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Consumer
    }

    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        let consumer_id = parse_id(self.kind(), id)?;
        let denial = format!("not authorized for consumer {}", consumer_id);
        let target = load_consumer(self.consumers.as_ref(), consumer_id, &denial).await?;
        same_user(ctx, &target, denial)
    }
}

/// A session follows the rule of the consumer that owns it.
pub struct SessionEvaluator {
    consumers: Arc<dyn ConsumerStore>,
}

impl SessionEvaluator {
    pub fn new(consumers: Arc<dyn ConsumerStore>) -> Self {
        Self { consumers }
    }
}

#[async_trait]
impl Evaluator for SessionEvaluator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Session
    }

    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        let session_id = parse_id(self.kind(), id)?;
        let denial = format!("not authorized for session {}", session_id);

        let session = match self.consumers.load_session_by_id(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return Err(AuthzError::forbidden(denial)),
            Err(e) => {
                tracing::warn!(error = %e, session_id = %session_id, "Failed to load session");
                return Err(AuthzError::forbidden(denial));
            }
        };

        let owner = load_consumer(self.consumers.as_ref(), session.consumer_id, &denial).await?;
        same_user(ctx, &owner, denial)
    }
}
