use async_trait::async_trait;
use std::sync::Arc;

use super::{require_id, AuthzError, CheckContext, Evaluator};
use crate::models::{AuthentifiedUser, PermissionLevel, ResourceKind};
use crate::services::{GrantPath, UserStore};

/// Username that names the caller's own user.
pub const ME: &str = "me";

async fn load_target(
    users: &dyn UserStore,
    ctx: &CheckContext<'_>,
    username: &str,
) -> Result<AuthentifiedUser, AuthzError> {
    let loaded = if username == ME {
        users.load_user_by_id(ctx.consumer.user_id).await
    } else {
        users.load_user_by_username(username).await
    };
    match loaded {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AuthzError::forbidden(format!("not authorized for user {}", username))),
        Err(e) => {
            tracing::warn!(error = %e, username = %username, "Failed to load user");
            Err(AuthzError::forbidden(format!("not authorized for user {}", username)))
        }
    }
}

/// Public profile: readable by anyone, writable by the user or an admin.
pub struct UserPublicEvaluator {
    users: Arc<dyn UserStore>,
}

impl UserPublicEvaluator {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Evaluator for UserPublicEvaluator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::UserPublic
    }

    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        let username = require_id(self.kind(), id)?;
        let target = load_target(self.users.as_ref(), ctx, username).await?;

        if target.id == ctx.consumer.user_id {
            return Ok(GrantPath::IsGranted);
        }
        if ctx.requested == PermissionLevel::Read {
            return Ok(GrantPath::IsGranted);
        }
        if ctx.consumer.is_admin() {
            return Ok(GrantPath::IsAdmin);
        }

        tracing::debug!(consumer_id = %ctx.consumer.id, user_id = %target.id, "User write denied");
        Err(AuthzError::forbidden(format!("not authorized for user {}", username)))
    }
}

/// Private user data: the user itself, maintainers for reads, admins always.
pub struct UserEvaluator {
    users: Arc<dyn UserStore>,
}

impl UserEvaluator {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Evaluator for UserEvaluator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        let username = require_id(self.kind(), id)?;
        let target = load_target(self.users.as_ref(), ctx, username).await?;

        if target.id == ctx.consumer.user_id {
            return Ok(GrantPath::IsGranted);
        }
        if ctx.requested == PermissionLevel::Read && ctx.consumer.is_maintainer() {
            return Ok(GrantPath::IsMaintainer);
        }
        if ctx.consumer.is_admin() {
            return Ok(GrantPath::IsAdmin);
        }

        tracing::debug!(consumer_id = %ctx.consumer.id, user_id = %target.id, "User access denied");
        Err(AuthzError::forbidden(format!("not authorized for user {}", username)))
    }
}
