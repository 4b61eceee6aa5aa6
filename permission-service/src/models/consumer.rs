//! Consumer model - the principal behind every request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthentifiedUser;

/// How a consumer was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsumerType {
    Local,
    Builtin,
    Ldap,
    CorporateSso,
    Github,
    Gitlab,
    Openid,
}

impl ConsumerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumerType::Local => "local",
            ConsumerType::Builtin => "builtin",
            ConsumerType::Ldap => "ldap",
            ConsumerType::CorporateSso => "corporate-sso",
            ConsumerType::Github => "github",
            ConsumerType::Gitlab => "gitlab",
            ConsumerType::Openid => "openid",
        }
    }

    pub fn is_external_provider(&self) -> bool {
        !matches!(self, ConsumerType::Local | ConsumerType::Builtin)
    }
}

/// Scopes a consumer may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsumerScope {
    User,
    #[serde(rename = "accesstoken")]
    AccessToken,
    Action,
    Admin,
    Group,
    Template,
    Project,
    Run,
    RunExecution,
    Hooks,
    Worker,
    WorkerModel,
    Hatchery,
    Service,
}

/// Worker record attached to a builtin consumer while it runs jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: Uuid,
    pub name: String,
    pub model_id: Option<i64>,
    /// Job run this worker has taken, if any.
    pub job_run_id: Option<i64>,
}

/// A principal. Resolves to exactly one user through `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub consumer_type: ConsumerType,
    pub scopes: Vec<ConsumerScope>,
    pub user_id: Uuid,
    pub created: DateTime<Utc>,
    /// Filled by the identity resolver. `None` means the user could not be found.
    #[serde(skip)]
    pub user: Option<AuthentifiedUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<Worker>,
}

impl Consumer {
    pub fn new(name: impl Into<String>, consumer_type: ConsumerType, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            consumer_type,
            scopes: Vec::new(),
            user_id,
            created: Utc::now(),
            user: None,
            worker: None,
        }
    }

    /// Consumer bound to an already resolved user.
    pub fn for_user(user: AuthentifiedUser) -> Self {
        let mut consumer = Self::new(user.username.clone(), ConsumerType::Local, user.id);
        consumer.user = Some(user);
        consumer
    }

    pub fn with_scopes(mut self, scopes: Vec<ConsumerScope>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_worker(mut self, worker: Worker) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Description and scopes are the only mutable fields.
    pub fn update_details(&mut self, description: impl Into<String>, scopes: Vec<ConsumerScope>) {
        self.description = description.into();
        self.scopes = scopes;
    }

    pub fn has_scope(&self, scope: ConsumerScope) -> bool {
        self.scopes.contains(&scope)
    }

    pub fn identity(&self) -> Option<&AuthentifiedUser> {
        self.user.as_ref()
    }

    pub fn group_ids(&self) -> Vec<i64> {
        self.user.as_ref().map(|u| u.group_ids()).unwrap_or_default()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin())
    }

    pub fn is_maintainer(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_maintainer())
    }

    pub fn as_worker(&self) -> Option<&Worker> {
        self.worker.as_ref()
    }
}

/// Authenticated session opened by a consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub expire_at: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(consumer_id: Uuid, duration: Duration) -> Self {
        let created = Utc::now();
        Self {
            id: Uuid::new_v4(),
            consumer_id,
            expire_at: created + duration,
            created,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expire_at <= Utc::now()
    }
}
