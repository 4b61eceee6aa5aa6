//! Shared fixture for permission-service integration tests.
//!
//! Every collaborator is served by one in-memory store; the decision cache
//! and sink are counting doubles so tests can assert on side effects.

#![allow(dead_code)]

use permission_service::{
    authz::{Authorizer, ResourceRefs, Stores},
    models::{
        AuthentifiedUser, Consumer, ConsumerType, Group, JobRunStatus, PermissionLevel,
        ResourceKind, Worker, WorkflowNodeJobRun,
    },
    services::{MemoryStore, MockDecisionCache, PermissionTarget, RecordingDecisionSink},
};
use std::sync::Arc;
use uuid::Uuid;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MockDecisionCache>,
    pub sink: Arc<RecordingDecisionSink>,
    pub authorizer: Authorizer,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_ttl(3600)
    }

    pub fn with_ttl(ttl_seconds: u64) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MockDecisionCache::new());
        let sink = Arc::new(RecordingDecisionSink::new());
        let authorizer = Authorizer::new(
            Stores::from_memory(store.clone()),
            cache.clone(),
            sink.clone(),
        )
        .with_worker_job_ttl(ttl_seconds);
        Self {
            store,
            cache,
            sink,
            authorizer,
        }
    }

    pub fn create_user(&self, username: &str) -> AuthentifiedUser {
        let user = AuthentifiedUser::new(username, format!("{} (test)", username));
        self.store.insert_user(user.clone()).unwrap();
        user
    }

    pub fn create_maintainer(&self, username: &str) -> AuthentifiedUser {
        let mut user = AuthentifiedUser::new(username, format!("{} (test)", username));
        user.maintainer = true;
        self.store.insert_user(user.clone()).unwrap();
        user
    }

    pub fn create_admin(&self, username: &str) -> AuthentifiedUser {
        let mut user = AuthentifiedUser::new(username, format!("{} (test)", username));
        user.admin = true;
        self.store.insert_user(user.clone()).unwrap();
        user
    }

    /// Create a group whose members are `(user, is_group_admin)` pairs.
    pub fn create_group(&self, id: i64, name: &str, members: &[(&AuthentifiedUser, bool)]) -> Group {
        let group = members.iter().fold(Group::new(id, name), |g, (user, admin)| {
            g.with_member(user.id, user.username.clone(), *admin)
        });
        self.store.insert_group(group.clone()).unwrap();
        group
    }

    pub fn grant_project(&self, key: &str, group_id: i64, level: PermissionLevel) {
        self.store
            .grant(PermissionTarget::project(key), group_id, level)
            .unwrap();
    }

    pub fn grant_workflow(&self, project_key: &str, name: &str, group_id: i64, level: PermissionLevel) {
        self.store
            .grant(PermissionTarget::workflow(project_key, name), group_id, level)
            .unwrap();
    }

    /// Create a job run executable by `exec_group_ids`.
    pub fn create_job(&self, id: i64, exec_group_ids: &[i64]) -> WorkflowNodeJobRun {
        let job = WorkflowNodeJobRun {
            id,
            status: JobRunStatus::Waiting,
            exec_groups: exec_group_ids
                .iter()
                .map(|gid| Group::new(*gid, format!("group-{}", gid)))
                .collect(),
        };
        self.store.insert_job(job.clone()).unwrap();
        job
    }

    /// A local consumer for `user`, hydrated through the identity resolver.
    pub async fn consumer_for(&self, user: &AuthentifiedUser) -> Consumer {
        let mut consumer = Consumer::new(
            format!("{}-token", user.username),
            ConsumerType::Local,
            user.id,
        );
        self.store.insert_consumer(consumer.clone()).unwrap();
        self.authorizer.resolve_identities(std::slice::from_mut(&mut consumer)).await.unwrap();
        consumer
    }

    /// A builtin worker consumer that took `job_run_id`.
    pub async fn worker_for(&self, user: &AuthentifiedUser, job_run_id: Option<i64>) -> Consumer {
        let mut consumer = Consumer::new(
            format!("{}-worker", user.username),
            ConsumerType::Builtin,
            user.id,
        )
        .with_worker(Worker {
            id: Uuid::new_v4(),
            name: format!("{}-worker", user.username),
            model_id: None,
            job_run_id,
        });
        self.store.insert_consumer(consumer.clone()).unwrap();
        self.authorizer.resolve_identities(std::slice::from_mut(&mut consumer)).await.unwrap();
        consumer
    }
}

pub fn refs(pairs: &[(ResourceKind, &str)]) -> ResourceRefs {
    pairs
        .iter()
        .fold(ResourceRefs::new(), |refs, (kind, id)| refs.with(*kind, *id))
}
