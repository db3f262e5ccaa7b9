//! Role hierarchy: Viewer < Editor < Admin.
//!
//! ここは純粋関数のみ。store や HTTP には依存しない。

use std::fmt;
use std::str::FromStr;

use crate::repos::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }

    /// `self` を持つユーザーが `required` を要求するリソースにアクセスできるか
    pub fn dominates(self, required: Role) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    // Role names are stored lowercase; anything else is not a role.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Returns true when `user` holds at least one role that dominates `required`.
///
/// - `None` (no user record) never passes.
/// - An unrecognized `required` value never passes.
/// - Unrecognized role names on the user are ignored.
pub fn has_authorized_role(user: Option<&User>, required: &str) -> bool {
    let Some(user) = user else {
        return false;
    };
    let Ok(required) = required.parse::<Role>() else {
        return false;
    };

    user.roles
        .iter()
        .filter_map(|name| name.parse::<Role>().ok())
        .any(|held| held.dominates(required))
}
