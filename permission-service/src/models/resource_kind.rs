//! Resource kinds and the route tags that name them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every kind of resource a permission check can target.
///
/// Declaration order is the evaluation order used by the authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ActionBuiltin,
    Project,
    Workflow,
    Group,
    WorkerModel,
    Action,
    Template,
    UserPublic,
    User,
    Consumer,
    Session,
    Job,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 12] = [
        ResourceKind::ActionBuiltin,
        ResourceKind::Project,
        ResourceKind::Workflow,
        ResourceKind::Group,
        ResourceKind::WorkerModel,
        ResourceKind::Action,
        ResourceKind::Template,
        ResourceKind::UserPublic,
        ResourceKind::User,
        ResourceKind::Consumer,
        ResourceKind::Session,
        ResourceKind::Job,
    ];

    /// Route variable that carries an identifier of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ResourceKind::ActionBuiltin => "permActionBuiltinName",
            ResourceKind::Project => "permProjectKey",
            ResourceKind::Workflow => "permWorkflowName",
            ResourceKind::Group => "permGroupName",
            ResourceKind::WorkerModel => "permModelName",
            ResourceKind::Action => "permActionName",
            ResourceKind::Template => "permTemplateSlug",
            ResourceKind::UserPublic => "permUsernamePublic",
            ResourceKind::User => "permUsername",
            ResourceKind::Consumer => "permConsumerID",
            ResourceKind::Session => "permSessionID",
            ResourceKind::Job => "permID",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ActionBuiltin => "action_builtin",
            ResourceKind::Project => "project",
            ResourceKind::Workflow => "workflow",
            ResourceKind::Group => "group",
            ResourceKind::WorkerModel => "worker_model",
            ResourceKind::Action => "action",
            ResourceKind::Template => "template",
            ResourceKind::UserPublic => "user_public",
            ResourceKind::User => "user",
            ResourceKind::Consumer => "consumer",
            ResourceKind::Session => "session",
            ResourceKind::Job => "job",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
