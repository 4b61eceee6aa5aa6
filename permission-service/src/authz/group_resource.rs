//! Resources addressed by name inside an owning group.

use async_trait::async_trait;
use std::sync::Arc;

use super::group::load_group;
use super::{require_id, AuthzError, CheckContext, Evaluator};
use crate::models::ResourceKind;
use crate::services::{GrantPath, GroupResourceStore, GroupStore, ServiceError};

/// Worker models, actions and templates: the named resource must exist in
/// the group named by the request's `permGroupName` variable.
pub struct GroupResourceEvaluator {
    kind: ResourceKind,
    groups: Arc<dyn GroupStore>,
    resources: Arc<dyn GroupResourceStore>,
}

impl GroupResourceEvaluator {
    pub fn worker_model(groups: Arc<dyn GroupStore>, resources: Arc<dyn GroupResourceStore>) -> Self {
        Self {
            kind: ResourceKind::WorkerModel,
            groups,
            resources,
        }
    }

    pub fn action(groups: Arc<dyn GroupStore>, resources: Arc<dyn GroupResourceStore>) -> Self {
        Self {
            kind: ResourceKind::Action,
            groups,
            resources,
        }
    }

    pub fn template(groups: Arc<dyn GroupStore>, resources: Arc<dyn GroupResourceStore>) -> Self {
        Self {
            kind: ResourceKind::Template,
            groups,
            resources,
        }
    }

    async fn exists(&self, name: &str, group_id: i64) -> Result<bool, ServiceError> {
        let found = match self.kind {
            ResourceKind::WorkerModel => self
                .resources
                .load_worker_model(name, group_id)
                .await?
                .is_some(),
            ResourceKind::Action => self.resources.load_action(name, group_id).await?.is_some(),
            ResourceKind::Template => self
                .resources
                .load_template(name, group_id)
                .await?
                .is_some(),
            other => {
                return Err(ServiceError::Config(format!(
                    "{} is not a group-scoped resource",
                    other
                )))
            }
        };
        Ok(found)
    }
}

#[async_trait]
impl Evaluator for GroupResourceEvaluator {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        let name = require_id(self.kind, id)?;
        let group_name = ctx.refs.group_name().ok_or_else(|| {
            AuthzError::wrong_request(format!("missing group name for {} {}", self.kind, name))
        })?;

        let group = load_group(self.groups.as_ref(), group_name).await?;
        if !self.exists(name, group.id).await? {
            return Err(AuthzError::not_found(format!(
                "{} {} does not exist in group {}",
                self.kind, name, group.name
            )));
        }
        Ok(GrantPath::IsGranted)
    }
}

/// Builtin actions are never checked on their own.
pub struct ActionBuiltinEvaluator;

#[async_trait]
impl Evaluator for ActionBuiltinEvaluator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ActionBuiltin
    }

    async fn evaluate(&self, _ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        Err(AuthzError::forbidden(format!("not authorized for action {}", id)))
    }
}
