//! Collaborator contracts the engine reads from.
//!
//! Implementations own persistence; the engine only calls these traits.
//! Every method returns `Ok(None)` for a missing record and `Err` for a
//! failed lookup.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Action, AuthSession, AuthentifiedUser, Consumer, Group, LinkGroupUser, PermissionLevel,
    WorkerModel, WorkflowNodeJobRun, WorkflowTemplate,
};

/// Resource a group-based permission grant applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionTarget {
    Project { key: String },
    Workflow { project_key: String, name: String },
}

impl PermissionTarget {
    pub fn project(key: impl Into<String>) -> Self {
        PermissionTarget::Project { key: key.into() }
    }

    pub fn workflow(project_key: impl Into<String>, name: impl Into<String>) -> Self {
        PermissionTarget::Workflow {
            project_key: project_key.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for PermissionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionTarget::Project { key } => write!(f, "{}", key),
            PermissionTarget::Workflow { project_key, name } => {
                write!(f, "{}/{}", project_key, name)
            }
        }
    }
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Highest level granted to any of `group_ids` on `target`.
    /// `None` when no group holds a grant; that sits below `Read`.
    async fn max_level(
        &self,
        target: &PermissionTarget,
        group_ids: &[i64],
    ) -> Result<Option<PermissionLevel>, anyhow::Error>;
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn load_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<AuthentifiedUser>, anyhow::Error>;
    async fn load_memberships_by_user_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<LinkGroupUser>, anyhow::Error>;
    async fn load_groups_by_ids(&self, ids: &[i64]) -> Result<Vec<Group>, anyhow::Error>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn load_user_by_id(&self, id: Uuid) -> Result<Option<AuthentifiedUser>, anyhow::Error>;
    async fn load_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AuthentifiedUser>, anyhow::Error>;
}

#[async_trait]
pub trait ConsumerStore: Send + Sync {
    async fn load_consumer_by_id(&self, id: Uuid) -> Result<Option<Consumer>, anyhow::Error>;
    async fn load_session_by_id(&self, id: Uuid) -> Result<Option<AuthSession>, anyhow::Error>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Load a group by name with its members.
    async fn load_group_by_name(&self, name: &str) -> Result<Option<Group>, anyhow::Error>;
}

/// Lookups for resources owned by a group.
#[async_trait]
pub trait GroupResourceStore: Send + Sync {
    async fn load_worker_model(
        &self,
        name: &str,
        group_id: i64,
    ) -> Result<Option<WorkerModel>, anyhow::Error>;
    /// Only default-type actions are addressable by name and group.
    async fn load_action(&self, name: &str, group_id: i64) -> Result<Option<Action>, anyhow::Error>;
    async fn load_template(
        &self,
        slug: &str,
        group_id: i64,
    ) -> Result<Option<WorkflowTemplate>, anyhow::Error>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn load_job_run(&self, id: i64) -> Result<Option<WorkflowNodeJobRun>, anyhow::Error>;
}
