use async_trait::async_trait;
use std::sync::Arc;

use super::{require_id, AuthzError, CheckContext, Evaluator};
use crate::config::DEFAULT_WORKER_JOB_TTL_SECONDS;
use crate::models::{ResourceKind, Worker, WorkflowNodeJobRun};
use crate::services::{DecisionCache, DecisionKey, GrantPath, JobStore};

/// Job runs. Workers asking to execute are limited to the job they took;
/// everyone else goes through the job's execution groups.
pub struct JobEvaluator {
    jobs: Arc<dyn JobStore>,
    cache: Arc<dyn DecisionCache>,
    ttl_seconds: u64,
}

impl JobEvaluator {
    pub fn new(jobs: Arc<dyn JobStore>, cache: Arc<dyn DecisionCache>) -> Self {
        Self {
            jobs,
            cache,
            ttl_seconds: DEFAULT_WORKER_JOB_TTL_SECONDS,
        }
    }

    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    async fn load_job(&self, job_id: i64) -> Result<WorkflowNodeJobRun, AuthzError> {
        match self.jobs.load_job_run(job_id).await {
            Ok(Some(job)) => Ok(job),
            Ok(None) => Err(AuthzError::forbidden(format!("not authorized for job {}", job_id))),
            Err(e) => {
                tracing::error!(error = %e, job_id, "Unable to load job");
                Err(AuthzError::forbidden(format!("not authorized for job {}", job_id)))
            }
        }
    }

    async fn check_worker(
        &self,
        ctx: &CheckContext<'_>,
        worker: &Worker,
        job_id: i64,
    ) -> Result<GrantPath, AuthzError> {
        let key = DecisionKey::new(ctx.consumer.id, ResourceKind::Job, job_id.to_string());

        // A cached denial stays in force until it expires, even if the
        // worker has since been assigned the job.
        match self.cache.get(&key).await {
            Ok(Some(true)) => return Ok(GrantPath::IsGranted),
            Ok(Some(false)) => {
                tracing::debug!(worker = %worker.name, job_id, "Cached worker denial");
                return Err(AuthzError::forbidden(format!("not authorized for job {}", job_id)));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, key = %key, "Decision cache read failed"),
        }

        let job = self.load_job(job_id).await?;
        let assigned = worker.job_run_id == Some(job.id);

        if let Err(e) = self.cache.set_with_ttl(&key, assigned, self.ttl_seconds).await {
            tracing::warn!(error = %e, key = %key, "Decision cache write failed");
        }

        if assigned {
            Ok(GrantPath::IsGranted)
        } else {
            tracing::debug!(worker = %worker.name, job_id, "Worker is not assigned to job");
            Err(AuthzError::forbidden(format!("not authorized for job {}", job_id)))
        }
    }
}

#[async_trait]
impl Evaluator for JobEvaluator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Job
    }

    async fn evaluate(&self, ctx: &CheckContext<'_>, id: &str) -> Result<GrantPath, AuthzError> {
        let raw = require_id(self.kind(), id)?;
        let job_id: i64 = raw
            .parse()
            .map_err(|_| AuthzError::wrong_request(format!("invalid given job id {}", raw)))?;

        if let Some(worker) = ctx.consumer.as_worker() {
            if !ctx.requested.is_read_class() {
                return self.check_worker(ctx, worker, job_id).await;
            }
        }

        let job = self.load_job(job_id).await?;
        if job.has_one_of(&ctx.consumer.group_ids()) {
            return Ok(GrantPath::IsGranted);
        }
        if ctx.consumer.is_admin() {
            return Ok(GrantPath::IsAdmin);
        }
        Err(AuthzError::forbidden(format!("not authorized for job {}", job_id)))
    }
}
