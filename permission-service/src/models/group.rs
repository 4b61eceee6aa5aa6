//! Group model - named collections of users.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Group entity with its ordered member list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

/// A user listed as a member of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub user_id: Uuid,
    pub username: String,
    /// Group admins may modify the group and its dependents.
    pub admin: bool,
}

/// Association between a user and a group. Unique per (user, group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGroupUser {
    pub id: i64,
    pub group_id: i64,
    pub user_id: Uuid,
    pub admin: bool,
}

impl Group {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, user_id: Uuid, username: impl Into<String>, admin: bool) -> Self {
        self.members.push(GroupMember {
            user_id,
            username: username.into(),
            admin,
        });
        self
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn is_admin_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|m| m.user_id == user_id && m.admin)
    }

    /// Same group without its member list, as attached to a resolved user.
    pub fn without_members(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            members: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_checks() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let group = Group::new(1, "ops")
            .with_member(alice, "alice", true)
            .with_member(bob, "bob", false);

        assert!(group.is_member(alice));
        assert!(group.is_member(bob));
        assert!(group.is_admin_member(alice));
        assert!(!group.is_admin_member(bob));
        assert!(!group.is_member(Uuid::new_v4()));
    }
}
