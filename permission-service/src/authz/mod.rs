//! Permission checks dispatched per resource kind.
//!
//! [`Authorizer::check_permission`] walks the resource kinds present in a
//! request and stops at the first evaluator that does not grant.

mod consumer;
mod engine;
mod error;
mod group;
mod group_resource;
mod job;
mod project;
mod refs;
mod user;

use async_trait::async_trait;

use crate::models::{Consumer, PermissionLevel, ResourceKind};
use crate::services::GrantPath;

pub use engine::{Authorizer, Stores};
pub use error::AuthzError;
pub use project::decide_by_level;
pub use refs::{ResourceRefs, PROJECT_KEY_FALLBACK};

/// Inputs shared by every evaluator of a single check.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub consumer: &'a Consumer,
    pub requested: PermissionLevel,
    pub refs: &'a ResourceRefs,
}

/// Policy for one resource kind.
#[async_trait]
pub trait Evaluator: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Decide access to the resource named `id`, returning the rule that
    /// granted it.
    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError>;
}

pub(crate) fn require_id<'a>(kind: ResourceKind, id: &'a str) -> Result<&'a str, AuthzError> {
    if id.is_empty() {
        return Err(AuthzError::wrong_request(format!("invalid given {} identifier", kind)));
    }
    Ok(id)
}
