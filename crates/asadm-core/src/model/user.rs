// ── User domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::mac::MacAddress;

/// Name of the group users fall into when none is given.
pub const DEFAULT_GROUP: &str = "__DEFAULT__";

/// How the appliance authenticates a user or a group's members.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuthMethod {
    #[default]
    Local,
    Ldap,
    Radius,
    Pam,
    Saml,
}

/// Administrative role. `Admin` maps to the superuser flag.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// Whether the allocator picks the address or the caller supplies it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IpAssignMode {
    #[default]
    Dynamic,
    Static,
}

/// A VPN user as stored on the appliance.
///
/// `password` is write-only: it is never populated by a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub email: String,
    pub auth_method: AuthMethod,
    pub group_name: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Textual date, `DD/MM/YYYY` on write.
    pub user_expiration: String,
    pub mac_addresses: Vec<MacAddress>,
    pub mfa: bool,
    pub role: Role,
    pub deny_access: bool,
    /// CIDR or IP entries, without the wire direction tag.
    pub access_control: Vec<String>,
    pub ip_address: String,
    pub ip_assign_mode: IpAssignMode,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>, auth_method: AuthMethod) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            auth_method,
            group_name: String::new(),
            password: None,
            user_expiration: String::new(),
            mac_addresses: Vec::new(),
            mfa: true,
            role: Role::User,
            deny_access: false,
            access_control: Vec::new(),
            ip_address: String::new(),
            ip_assign_mode: IpAssignMode::Dynamic,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.deny_access
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_access_control(&self) -> bool {
        !self.access_control.is_empty()
    }
}

/// Partial update of a user. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub user_expiration: Option<String>,
    pub deny_access: Option<bool>,
    pub group_name: Option<String>,
    /// Raw addresses, normalized by the service.
    pub mac_addresses: Option<Vec<String>>,
    pub access_control: Option<Vec<String>>,
    pub ip_address: Option<String>,
    pub ip_assign_mode: Option<IpAssignMode>,
}

/// Input for creating a user. MAC addresses are raw and normalized on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub auth_method: AuthMethod,
    pub group_name: String,
    pub password: Option<String>,
    pub user_expiration: String,
    pub mac_addresses: Vec<String>,
    pub access_control: Vec<String>,
    pub ip_address: String,
    pub ip_assign_mode: Option<IpAssignMode>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("LDAP".parse::<AuthMethod>().unwrap(), AuthMethod::Ldap);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Static".parse::<IpAssignMode>().unwrap(), IpAssignMode::Static);
        assert_eq!(AuthMethod::Local.to_string(), "local");
        assert_eq!(Role::User.to_string(), "User");
    }

    #[test]
    fn new_user_defaults() {
        let u = User::new("alice", "a@example.com", AuthMethod::Local);
        assert!(u.mfa);
        assert!(u.is_enabled());
        assert_eq!(u.role, Role::User);
        assert_eq!(u.ip_assign_mode, IpAssignMode::Dynamic);
    }
}
