// ── Group domain types ──

use serde::{Deserialize, Serialize};

use super::user::{AuthMethod, Role};

/// A user group with its private address space.
///
/// `group_range` entries are `"start-end"` IPv4 pairs and only make sense
/// inside one of the `group_subnet` blocks.
///
/// Fields missing from deserialized input take the creation defaults:
/// MFA on, `User` role, enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub group_name: String,
    pub auth_method: AuthMethod,
    pub mfa: bool,
    pub role: Role,
    pub deny_access: bool,
    pub access_control: Vec<String>,
    pub group_subnet: Vec<String>,
    pub group_range: Vec<String>,
}

impl Group {
    pub fn new(group_name: impl Into<String>, auth_method: AuthMethod) -> Self {
        Self {
            group_name: group_name.into(),
            auth_method,
            mfa: true,
            role: Role::User,
            deny_access: false,
            access_control: Vec::new(),
            group_subnet: Vec::new(),
            group_range: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.deny_access
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new(String::new(), AuthMethod::Local)
    }
}

/// Partial update of a group. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    pub mfa: Option<bool>,
    pub role: Option<Role>,
    pub deny_access: Option<bool>,
    pub access_control: Option<Vec<String>>,
    pub group_subnet: Option<Vec<String>>,
    pub group_range: Option<Vec<String>>,
}

impl GroupUpdate {
    /// Overlay the supplied fields onto `existing`.
    pub fn apply(&self, existing: &Group) -> Group {
        let mut merged = existing.clone();
        if let Some(mfa) = self.mfa {
            merged.mfa = mfa;
        }
        if let Some(role) = self.role {
            merged.role = role;
        }
        if let Some(deny) = self.deny_access {
            merged.deny_access = deny;
        }
        if let Some(ref acl) = self.access_control {
            merged.access_control.clone_from(acl);
        }
        if let Some(ref subnets) = self.group_subnet {
            merged.group_subnet.clone_from(subnets);
        }
        if let Some(ref ranges) = self.group_range {
            merged.group_range.clone_from(ranges);
        }
        merged
    }
}
