use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use super::error::ServiceError;
use super::stores::IdentityStore;
use crate::models::{AuthentifiedUser, Consumer, Group, LinkGroupUser, UserGroup};

/// Hydrates consumers with their user and the user's group memberships.
///
/// Loads are batched by type: one user load, one membership load and one
/// group load per call, whatever the number of consumers.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_identity(&self, consumer: &mut Consumer) -> Result<(), ServiceError> {
        self.resolve_identities(std::slice::from_mut(consumer)).await
    }

    /// Attach to each consumer its user, with groups. A consumer whose user
    /// cannot be found is left with `user = None`. Any failed load aborts
    /// the whole batch and leaves every consumer untouched.
    #[tracing::instrument(skip_all, fields(consumers = consumers.len()))]
    pub async fn resolve_identities(&self, consumers: &mut [Consumer]) -> Result<(), ServiceError> {
        if consumers.is_empty() {
            return Ok(());
        }

        let user_ids = distinct(consumers.iter().map(|c| c.user_id));
        let users = self.store.load_users_by_ids(&user_ids).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load users");
            ServiceError::Store(e)
        })?;

        let mut groups_by_user: HashMap<Uuid, Vec<UserGroup>> = HashMap::new();
        if !users.is_empty() {
            let found: Vec<Uuid> = users.iter().map(|u| u.id).collect();
            groups_by_user = self.load_user_groups(&found).await?;
        }

        let resolved: HashMap<Uuid, AuthentifiedUser> = users
            .into_iter()
            .map(|mut user| {
                user.groups = groups_by_user.remove(&user.id).unwrap_or_default();
                (user.id, user)
            })
            .collect();

        for consumer in consumers.iter_mut() {
            consumer.user = resolved.get(&consumer.user_id).cloned();
            if consumer.user.is_none() {
                tracing::warn!(
                    consumer_id = %consumer.id,
                    user_id = %consumer.user_id,
                    "Consumer references an unknown user"
                );
            }
        }

        Ok(())
    }

    async fn load_user_groups(
        &self,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<UserGroup>>, ServiceError> {
        let links = self
            .store
            .load_memberships_by_user_ids(user_ids)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load group memberships");
                ServiceError::Store(e)
            })?;

        let mut seen = HashSet::new();
        let links: Vec<LinkGroupUser> = links
            .into_iter()
            .filter(|l| seen.insert((l.user_id, l.group_id)))
            .collect();
        if links.is_empty() {
            return Ok(HashMap::new());
        }

        let group_ids = distinct(links.iter().map(|l| l.group_id));
        let groups: HashMap<i64, Group> = self
            .store
            .load_groups_by_ids(&group_ids)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load groups");
                ServiceError::Store(e)
            })?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        let mut by_user: HashMap<Uuid, Vec<UserGroup>> = HashMap::new();
        for link in links {
            // Links to groups that no longer exist are skipped.
            let Some(group) = groups.get(&link.group_id) else {
                tracing::warn!(group_id = link.group_id, "Membership references an unknown group");
                continue;
            };
            by_user.entry(link.user_id).or_default().push(UserGroup {
                group: group.clone(),
                link,
            });
        }
        Ok(by_user)
    }
}

fn distinct<T: Copy + Eq + std::hash::Hash>(ids: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
