use async_trait::async_trait;
use std::sync::Arc;

use super::{require_id, AuthzError, CheckContext, Evaluator};
use crate::models::{Group, PermissionLevel, ResourceKind};
use crate::services::{GrantPath, GroupStore, ServiceError};

pub struct GroupEvaluator {
    groups: Arc<dyn GroupStore>,
}

impl GroupEvaluator {
    pub fn new(groups: Arc<dyn GroupStore>) -> Self {
        Self { groups }
    }
}

/// Load a group by name, mapping absence to `NotFound`.
pub(crate) async fn load_group(groups: &dyn GroupStore, name: &str) -> Result<Group, AuthzError> {
    groups
        .load_group_by_name(name)
        .await
        .map_err(ServiceError::Store)?
        .ok_or_else(|| AuthzError::not_found(format!("group {} does not exist", name)))
}

#[async_trait]
impl Evaluator for GroupEvaluator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Group
    }

    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        let name = require_id(self.kind(), id)?;
        let group = load_group(self.groups.as_ref(), name).await?;
        let user_id = ctx.consumer.user_id;

        let path = if ctx.requested > PermissionLevel::Read {
            // Only group admins or platform admins may change a group or its dependents.
            if group.is_admin_member(user_id) {
                Some(GrantPath::IsGranted)
            } else if ctx.consumer.is_admin() {
                Some(GrantPath::IsAdmin)
            } else {
                None
            }
        } else if group.is_member(user_id) {
            Some(GrantPath::IsGranted)
        } else if ctx.consumer.is_maintainer() {
            Some(GrantPath::IsMaintainer)
        } else {
            None
        };

        path.ok_or_else(|| {
            tracing::debug!(
                consumer_id = %ctx.consumer.id,
                group = %group.name,
                requested = %ctx.requested,
                "Group access denied"
            );
            AuthzError::forbidden(format!("not authorized for group {}", group.name))
        })
    }
}
