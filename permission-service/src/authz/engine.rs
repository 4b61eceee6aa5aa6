use std::sync::Arc;
use tracing::Instrument;

use super::consumer::{ConsumerEvaluator, SessionEvaluator};
use super::group::GroupEvaluator;
use super::group_resource::{ActionBuiltinEvaluator, GroupResourceEvaluator};
use super::job::JobEvaluator;
use super::project::{ProjectEvaluator, WorkflowEvaluator};
use super::user::{UserEvaluator, UserPublicEvaluator};
use super::{AuthzError, CheckContext, Evaluator, ResourceRefs};
use crate::config::EngineConfig;
use crate::models::{Consumer, PermissionLevel, ResourceKind};
use crate::services::{
    build_decision_cache, build_decision_sink, ConsumerStore, DecisionCache, DecisionEvent,
    DecisionSink, GroupResourceStore, GroupStore, IdentityResolver, IdentityStore, JobStore,
    MemoryStore, PermissionStore, ServiceError, UserStore,
};

/// Collaborators the authorizer reads from.
#[derive(Clone)]
pub struct Stores {
    pub permissions: Arc<dyn PermissionStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub users: Arc<dyn UserStore>,
    pub consumers: Arc<dyn ConsumerStore>,
    pub groups: Arc<dyn GroupStore>,
    pub resources: Arc<dyn GroupResourceStore>,
    pub jobs: Arc<dyn JobStore>,
}

impl Stores {
    /// Serve every collaborator from one in-memory store.
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            permissions: store.clone(),
            identities: store.clone(),
            users: store.clone(),
            consumers: store.clone(),
            groups: store.clone(),
            resources: store.clone(),
            jobs: store,
        }
    }
}

/// Entry point for permission checks.
pub struct Authorizer {
    resolver: IdentityResolver,
    sink: Arc<dyn DecisionSink>,
    action_builtin: ActionBuiltinEvaluator,
    project: ProjectEvaluator,
    workflow: WorkflowEvaluator,
    group: GroupEvaluator,
    worker_model: GroupResourceEvaluator,
    action: GroupResourceEvaluator,
    template: GroupResourceEvaluator,
    user_public: UserPublicEvaluator,
    user: UserEvaluator,
    consumer: ConsumerEvaluator,
    session: SessionEvaluator,
    job: JobEvaluator,
}

impl Authorizer {
    pub fn new(stores: Stores, cache: Arc<dyn DecisionCache>, sink: Arc<dyn DecisionSink>) -> Self {
        Self {
            resolver: IdentityResolver::new(stores.identities.clone()),
            sink,
            action_builtin: ActionBuiltinEvaluator,
            project: ProjectEvaluator::new(stores.permissions.clone()),
            workflow: WorkflowEvaluator::new(stores.permissions.clone()),
            group: GroupEvaluator::new(stores.groups.clone()),
            worker_model: GroupResourceEvaluator::worker_model(
                stores.groups.clone(),
                stores.resources.clone(),
            ),
            action: GroupResourceEvaluator::action(stores.groups.clone(), stores.resources.clone()),
            template: GroupResourceEvaluator::template(stores.groups.clone(), stores.resources),
            user_public: UserPublicEvaluator::new(stores.users.clone()),
            user: UserEvaluator::new(stores.users),
            consumer: ConsumerEvaluator::new(stores.consumers.clone()),
            session: SessionEvaluator::new(stores.consumers),
            job: JobEvaluator::new(stores.jobs, cache),
        }
    }

    /// Build the cache and sink selected by configuration.
    pub async fn from_config(config: &EngineConfig, stores: Stores) -> Result<Self, ServiceError> {
        let cache = build_decision_cache(config).await?;
        let sink: Arc<dyn DecisionSink> = Arc::from(build_decision_sink(config.sink));
        tracing::info!(
            service = %config.service_name,
            backend = ?config.cache.backend,
            ttl_seconds = config.cache.worker_job_ttl_seconds,
            "Authorizer ready"
        );
        Ok(Self::new(stores, cache, sink).with_worker_job_ttl(config.cache.worker_job_ttl_seconds))
    }

    pub fn with_worker_job_ttl(mut self, ttl_seconds: u64) -> Self {
        self.job = self.job.with_ttl(ttl_seconds);
        self
    }

    /// Hydrate consumers before checking them.
    pub async fn resolve_identities(&self, consumers: &mut [Consumer]) -> Result<(), ServiceError> {
        self.resolver.resolve_identities(consumers).await
    }

    pub fn evaluator_for(&self, kind: ResourceKind) -> &dyn Evaluator {
        match kind {
            ResourceKind::ActionBuiltin => &self.action_builtin,
            ResourceKind::Project => &self.project,
            ResourceKind::Workflow => &self.workflow,
            ResourceKind::Group => &self.group,
            ResourceKind::WorkerModel => &self.worker_model,
            ResourceKind::Action => &self.action,
            ResourceKind::Template => &self.template,
            ResourceKind::UserPublic => &self.user_public,
            ResourceKind::User => &self.user,
            ResourceKind::Consumer => &self.consumer,
            ResourceKind::Session => &self.session,
            ResourceKind::Job => &self.job,
        }
    }

    /// Check `requested` on every resource present in `refs`. The first
    /// evaluator that does not grant ends the check with its error.
    pub async fn check_permission(
        &self,
        consumer: &Consumer,
        requested: PermissionLevel,
        refs: &ResourceRefs,
    ) -> Result<(), AuthzError> {
        let ctx = CheckContext {
            consumer,
            requested,
            refs,
        };

        for kind in refs.kinds() {
            let Some(id) = refs.get(kind) else {
                continue;
            };
            let span = tracing::debug_span!(
                "authz.evaluate",
                evaluator = kind.as_str(),
                consumer_id = %consumer.id,
                resource = %id,
                requested = %requested,
            );
            let path = self
                .evaluator_for(kind)
                .evaluate(&ctx, id)
                .instrument(span)
                .await
                .inspect_err(|e| {
                    tracing::debug!(
                        consumer_id = %consumer.id,
                        resource_kind = %kind,
                        resource = %id,
                        error = %e,
                        "Permission check failed"
                    );
                })?;

            let event = DecisionEvent {
                consumer_id: consumer.id,
                resource_kind: kind,
                resource: id.to_string(),
                path,
            };
            if let Err(e) = self.sink.emit(&event) {
                tracing::debug!(error = %e, "Failed to emit decision event");
            }
        }

        Ok(())
    }

    /// Same as [`check_permission`](Self::check_permission) with a raw level
    /// value, rejecting values off the scale.
    pub async fn check_permission_value(
        &self,
        consumer: &Consumer,
        requested: i32,
        refs: &ResourceRefs,
    ) -> Result<(), AuthzError> {
        let level = PermissionLevel::try_from(requested)
            .map_err(|e| AuthzError::wrong_request(e.to_string()))?;
        self.check_permission(consumer, level, refs).await
    }
}
