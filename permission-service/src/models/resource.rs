//! Group-scoped resources and job runs.

use serde::{Deserialize, Serialize};

use super::Group;

/// Worker model owned by a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerModel {
    pub id: i64,
    pub name: String,
    pub group_id: i64,
    pub model_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Default,
    Builtin,
    Plugin,
    Joined,
}

/// Action owned by a group. Builtin actions have no owning group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: i64,
    pub name: String,
    pub group_id: Option<i64>,
    pub action_type: ActionType,
}

/// Workflow template, addressed by slug inside its group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub group_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobRunStatus {
    Waiting,
    Building,
    Success,
    Fail,
    Stopped,
}

/// A job run and the groups allowed to execute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNodeJobRun {
    pub id: i64,
    pub status: JobRunStatus,
    pub exec_groups: Vec<Group>,
}

impl WorkflowNodeJobRun {
    pub fn has_one_of(&self, group_ids: &[i64]) -> bool {
        self.exec_groups.iter().any(|g| group_ids.contains(&g.id))
    }
}
