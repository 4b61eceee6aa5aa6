//! In-memory store implementing every collaborator trait.
//!
//! Used for embedded deployments and as the test double: each trait method
//! records a call so tests can assert on lookup counts. `fail_lookups`
//! turns every call into an error and `fail_method` fails a single method.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::stores::{
    ConsumerStore, GroupResourceStore, GroupStore, IdentityStore, JobStore, PermissionStore,
    PermissionTarget, UserStore,
};
use crate::models::{
    Action, ActionType, AuthSession, AuthentifiedUser, Consumer, Group, GroupMember,
    LinkGroupUser, PermissionLevel, WorkerModel, WorkflowNodeJobRun, WorkflowTemplate,
};

#[derive(Debug, Clone)]
struct Grant {
    target: PermissionTarget,
    group_id: i64,
    level: PermissionLevel,
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<AuthentifiedUser>>,
    groups: Mutex<Vec<Group>>,
    links: Mutex<Vec<LinkGroupUser>>,
    grants: Mutex<Vec<Grant>>,
    consumers: Mutex<Vec<Consumer>>,
    sessions: Mutex<Vec<AuthSession>>,
    worker_models: Mutex<Vec<WorkerModel>>,
    actions: Mutex<Vec<Action>>,
    templates: Mutex<Vec<WorkflowTemplate>>,
    jobs: Mutex<Vec<WorkflowNodeJobRun>>,
    fail: AtomicBool,
    failing: DashSet<&'static str>,
    calls: DashMap<&'static str, usize>,
}

fn lock<'a, T>(m: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, anyhow::Error> {
    m.lock()
        .map_err(|e| anyhow::anyhow!("Memory store {} mutex poisoned: {}", what, e))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `method` was called on any collaborator trait.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.get(method).map(|c| *c).unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.calls.clear();
    }

    /// Make every subsequent lookup fail (or succeed again).
    pub fn fail_lookups(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make only `method` fail; other lookups keep working.
    pub fn fail_method(&self, method: &'static str) {
        self.failing.insert(method);
    }

    fn enter(&self, method: &'static str) -> Result<(), anyhow::Error> {
        *self.calls.entry(method).or_insert(0) += 1;
        if self.fail.load(Ordering::SeqCst) || self.failing.contains(method) {
            return Err(anyhow::anyhow!("{} failed: store unavailable", method));
        }
        Ok(())
    }

    pub fn insert_user(&self, user: AuthentifiedUser) -> Result<(), anyhow::Error> {
        let mut users = lock(&self.users, "users")?;
        users.retain(|u| u.id != user.id);
        users.push(user);
        Ok(())
    }

    /// Replace a stored user, e.g. to flip its platform roles.
    pub fn update_user<F>(&self, id: Uuid, f: F) -> Result<(), anyhow::Error>
    where
        F: FnOnce(&mut AuthentifiedUser),
    {
        let mut users = lock(&self.users, "users")?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("User {} not found", id))?;
        f(user);
        Ok(())
    }

    /// Store a group and one membership link per listed member.
    pub fn insert_group(&self, group: Group) -> Result<(), anyhow::Error> {
        let mut links = lock(&self.links, "links")?;
        for member in &group.members {
            push_link(&mut links, group.id, member.user_id, member.admin);
        }
        let mut groups = lock(&self.groups, "groups")?;
        groups.retain(|g| g.id != group.id);
        groups.push(group);
        Ok(())
    }

    pub fn add_member(&self, group_id: i64, user: &AuthentifiedUser, admin: bool) -> Result<(), anyhow::Error> {
        let mut groups = lock(&self.groups, "groups")?;
        let group = groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| anyhow::anyhow!("Group {} not found", group_id))?;
        if !group.is_member(user.id) {
            group.members.push(GroupMember {
                user_id: user.id,
                username: user.username.clone(),
                admin,
            });
        }
        let mut links = lock(&self.links, "links")?;
        push_link(&mut links, group_id, user.id, admin);
        Ok(())
    }

    /// Store a raw link, bypassing the (user, group) uniqueness check.
    pub fn insert_link(&self, link: LinkGroupUser) -> Result<(), anyhow::Error> {
        lock(&self.links, "links")?.push(link);
        Ok(())
    }

    pub fn grant(
        &self,
        target: PermissionTarget,
        group_id: i64,
        level: PermissionLevel,
    ) -> Result<(), anyhow::Error> {
        lock(&self.grants, "grants")?.push(Grant {
            target,
            group_id,
            level,
        });
        Ok(())
    }

    pub fn insert_consumer(&self, consumer: Consumer) -> Result<(), anyhow::Error> {
        lock(&self.consumers, "consumers")?.push(consumer);
        Ok(())
    }

    pub fn insert_session(&self, session: AuthSession) -> Result<(), anyhow::Error> {
        lock(&self.sessions, "sessions")?.push(session);
        Ok(())
    }

    pub fn insert_worker_model(&self, model: WorkerModel) -> Result<(), anyhow::Error> {
        lock(&self.worker_models, "worker models")?.push(model);
        Ok(())
    }

    pub fn insert_action(&self, action: Action) -> Result<(), anyhow::Error> {
        lock(&self.actions, "actions")?.push(action);
        Ok(())
    }

    pub fn insert_template(&self, template: WorkflowTemplate) -> Result<(), anyhow::Error> {
        lock(&self.templates, "templates")?.push(template);
        Ok(())
    }

    pub fn insert_job(&self, job: WorkflowNodeJobRun) -> Result<(), anyhow::Error> {
        lock(&self.jobs, "jobs")?.push(job);
        Ok(())
    }
}

fn push_link(links: &mut Vec<LinkGroupUser>, group_id: i64, user_id: Uuid, admin: bool) {
    if links
        .iter()
        .any(|l| l.group_id == group_id && l.user_id == user_id)
    {
        return;
    }
    let id = links.len() as i64 + 1;
    links.push(LinkGroupUser {
        id,
        group_id,
        user_id,
        admin,
    });
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn max_level(
        &self,
        target: &PermissionTarget,
        group_ids: &[i64],
    ) -> Result<Option<PermissionLevel>, anyhow::Error> {
        self.enter("max_level")?;
        let grants = lock(&self.grants, "grants")?;
        Ok(grants
            .iter()
            .filter(|g| &g.target == target && group_ids.contains(&g.group_id))
            .map(|g| g.level)
            .max())
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn load_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<AuthentifiedUser>, anyhow::Error> {
        self.enter("load_users_by_ids")?;
        let users = lock(&self.users, "users")?;
        Ok(users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(|u| AuthentifiedUser {
                groups: Vec::new(),
                ..u.clone()
            })
            .collect())
    }

    async fn load_memberships_by_user_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<LinkGroupUser>, anyhow::Error> {
        self.enter("load_memberships_by_user_ids")?;
        let links = lock(&self.links, "links")?;
        Ok(links
            .iter()
            .filter(|l| ids.contains(&l.user_id))
            .cloned()
            .collect())
    }

    async fn load_groups_by_ids(&self, ids: &[i64]) -> Result<Vec<Group>, anyhow::Error> {
        self.enter("load_groups_by_ids")?;
        let groups = lock(&self.groups, "groups")?;
        Ok(groups
            .iter()
            .filter(|g| ids.contains(&g.id))
            .map(Group::without_members)
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn load_user_by_id(&self, id: Uuid) -> Result<Option<AuthentifiedUser>, anyhow::Error> {
        self.enter("load_user_by_id")?;
        Ok(lock(&self.users, "users")?.iter().find(|u| u.id == id).cloned())
    }

    async fn load_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AuthentifiedUser>, anyhow::Error> {
        self.enter("load_user_by_username")?;
        Ok(lock(&self.users, "users")?
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl ConsumerStore for MemoryStore {
    async fn load_consumer_by_id(&self, id: Uuid) -> Result<Option<Consumer>, anyhow::Error> {
        self.enter("load_consumer_by_id")?;
        Ok(lock(&self.consumers, "consumers")?
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn load_session_by_id(&self, id: Uuid) -> Result<Option<AuthSession>, anyhow::Error> {
        self.enter("load_session_by_id")?;
        Ok(lock(&self.sessions, "sessions")?
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn load_group_by_name(&self, name: &str) -> Result<Option<Group>, anyhow::Error> {
        self.enter("load_group_by_name")?;
        Ok(lock(&self.groups, "groups")?
            .iter()
            .find(|g| g.name == name)
            .cloned())
    }
}

#[async_trait]
impl GroupResourceStore for MemoryStore {
    async fn load_worker_model(
        &self,
        name: &str,
        group_id: i64,
    ) -> Result<Option<WorkerModel>, anyhow::Error> {
        self.enter("load_worker_model")?;
        Ok(lock(&self.worker_models, "worker models")?
            .iter()
            .find(|m| m.name == name && m.group_id == group_id)
            .cloned())
    }

    async fn load_action(&self, name: &str, group_id: i64) -> Result<Option<Action>, anyhow::Error> {
        self.enter("load_action")?;
        Ok(lock(&self.actions, "actions")?
            .iter()
            .find(|a| {
                a.name == name
                    && a.group_id == Some(group_id)
                    && a.action_type == ActionType::Default
            })
            .cloned())
    }

    async fn load_template(
        &self,
        slug: &str,
        group_id: i64,
    ) -> Result<Option<WorkflowTemplate>, anyhow::Error> {
        self.enter("load_template")?;
        Ok(lock(&self.templates, "templates")?
            .iter()
            .find(|t| t.slug == slug && t.group_id == group_id)
            .cloned())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn load_job_run(&self, id: i64) -> Result<Option<WorkflowNodeJobRun>, anyhow::Error> {
        self.enter("load_job_run")?;
        Ok(lock(&self.jobs, "jobs")?.iter().find(|j| j.id == id).cloned())
    }
}
