//! Permission level scale.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access level granted to a group on a resource, or requested by a caller.
///
/// Variants are declared in ascending order so the derived `Ord` matches the
/// numeric scale: `Read < ReadExecute < ReadWriteExecute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum PermissionLevel {
    Read = 4,
    ReadExecute = 5,
    ReadWriteExecute = 7,
}

/// Raised when a raw level does not belong to the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid permission level {0}")]
pub struct InvalidPermissionLevel(pub i32);

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 3] = [
        PermissionLevel::Read,
        PermissionLevel::ReadExecute,
        PermissionLevel::ReadWriteExecute,
    ];

    pub const fn value(self) -> i32 {
        self as i32
    }

    /// Read-class requests sit strictly below `ReadExecute`.
    pub fn is_read_class(self) -> bool {
        self < PermissionLevel::ReadExecute
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Read => "read",
            PermissionLevel::ReadExecute => "read_execute",
            PermissionLevel::ReadWriteExecute => "read_write_execute",
        }
    }
}

impl TryFrom<i32> for PermissionLevel {
    type Error = InvalidPermissionLevel;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(PermissionLevel::Read),
            5 => Ok(PermissionLevel::ReadExecute),
            7 => Ok(PermissionLevel::ReadWriteExecute),
            other => Err(InvalidPermissionLevel(other)),
        }
    }
}

impl From<PermissionLevel> for i32 {
    fn from(level: PermissionLevel) -> Self {
        level.value()
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
