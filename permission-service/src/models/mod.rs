//! Domain models for the permission engine.

mod consumer;
mod group;
mod permission;
mod resource;
mod resource_kind;
mod user;

pub use consumer::{AuthSession, Consumer, ConsumerScope, ConsumerType, Worker};
pub use group::{Group, GroupMember, LinkGroupUser};
pub use permission::{InvalidPermissionLevel, PermissionLevel};
pub use resource::{
    Action, ActionType, JobRunStatus, WorkerModel, WorkflowNodeJobRun, WorkflowTemplate,
};
pub use resource_kind::ResourceKind;
pub use user::{AuthentifiedUser, UserGroup};
