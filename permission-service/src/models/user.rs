//! User model - human or service identities behind consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Group, LinkGroupUser};

/// A resolved user identity.
///
/// `groups` is never stored with the user; the identity resolver computes it
/// from membership links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthentifiedUser {
    pub id: Uuid,
    pub username: String,
    pub fullname: String,
    /// Platform administrator.
    pub admin: bool,
    /// Platform maintainer (read access everywhere).
    pub maintainer: bool,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub groups: Vec<UserGroup>,
}

/// A group the user belongs to, with the link that put them there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGroup {
    pub group: Group,
    pub link: LinkGroupUser,
}

impl AuthentifiedUser {
    pub fn new(username: impl Into<String>, fullname: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            fullname: fullname.into(),
            admin: false,
            maintainer: false,
            created: Utc::now(),
            groups: Vec::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Administrators carry maintainer privileges too.
    pub fn is_maintainer(&self) -> bool {
        self.maintainer || self.admin
    }

    pub fn group_ids(&self) -> Vec<i64> {
        self.groups.iter().map(|g| g.group.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_implies_maintainer() {
        let mut user = AuthentifiedUser::new("root", "Root");
        assert!(!user.is_maintainer());
        user.admin = true;
        assert!(user.is_admin());
        assert!(user.is_maintainer());
    }

    #[test]
    fn test_maintainer_is_not_admin() {
        let mut user = AuthentifiedUser::new("ops", "Ops");
        user.maintainer = true;
        assert!(user.is_maintainer());
        assert!(!user.is_admin());
    }
}
