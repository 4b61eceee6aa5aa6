use async_trait::async_trait;
use std::sync::Arc;

use super::{require_id, AuthzError, CheckContext, Evaluator};
use crate::models::{Consumer, PermissionLevel, ResourceKind};
use crate::services::{GrantPath, PermissionStore, PermissionTarget, ServiceError};

/// Level-based decision shared by projects and workflows.
///
/// A sufficient group level always grants. Below it, a read-class request
/// falls back to the maintainer role and anything from `ReadExecute` up
/// falls back to the admin role. `None` means denied.
pub fn decide_by_level(
    max_level: Option<PermissionLevel>,
    requested: PermissionLevel,
    consumer: &Consumer,
) -> Option<GrantPath> {
    if max_level.is_some_and(|level| level >= requested) {
        return Some(GrantPath::IsGranted);
    }
    if requested.is_read_class() {
        return consumer.is_maintainer().then_some(GrantPath::IsMaintainer);
    }
    consumer.is_admin().then_some(GrantPath::IsAdmin)
}

async fn check_target(
    store: &dyn PermissionStore,
    ctx: &CheckContext<'_>,
    kind: ResourceKind,
    target: PermissionTarget,
) -> Result<GrantPath, AuthzError> {
    let group_ids = ctx.consumer.group_ids();
    let max_level = store
        .max_level(&target, &group_ids)
        .await
        .map_err(ServiceError::Store)?;

    match decide_by_level(max_level, ctx.requested, ctx.consumer) {
        Some(path) => {
            tracing::debug!(
                consumer_id = %ctx.consumer.id,
                resource_kind = %kind,
                resource = %target,
                requested = %ctx.requested,
                max_level = ?max_level,
                path = %path,
                "Access granted"
            );
            Ok(path)
        }
        None => {
            tracing::debug!(
                consumer_id = %ctx.consumer.id,
                resource_kind = %kind,
                resource = %target,
                requested = %ctx.requested,
                max_level = ?max_level,
                "Access denied"
            );
            Err(AuthzError::forbidden(format!("not authorized for {} {}", kind, target)))
        }
    }
}

pub struct ProjectEvaluator {
    store: Arc<dyn PermissionStore>,
}

impl ProjectEvaluator {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Evaluator for ProjectEvaluator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Project
    }

    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        let key = require_id(self.kind(), id)?;
        check_target(
            self.store.as_ref(),
            ctx,
            self.kind(),
            PermissionTarget::project(key),
        )
        .await
    }
}

pub struct WorkflowEvaluator {
    store: Arc<dyn PermissionStore>,
}

impl WorkflowEvaluator {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Evaluator for WorkflowEvaluator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Workflow
    }

    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        let Some(project_key) = ctx.refs.project_key() else {
            return Err(AuthzError::forbidden(format!(
                "not authorized for workflow {}, missing project key value",
                id
            )));
        };
        let name = require_id(self.kind(), id)?;
        check_target(
            self.store.as_ref(),
            ctx,
            self.kind(),
            PermissionTarget::workflow(project_key, name),
        )
        .await
    }
}
