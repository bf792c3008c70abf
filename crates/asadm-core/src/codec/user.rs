// ── User codec ──

use tracing::warn;

use asadm_api::{HW_ADDR_SLOTS, PropertyBag};

use super::{
    PROP_ACCESS, PROP_AUTH_TYPE, PROP_CONN_IP, PROP_DENY, PROP_EMAIL, PROP_EXPIRATION, PROP_GROUP,
    PROP_MFA, PROP_SUPERUSER, PROP_TYPE, TAG_NAT, TYPE_USER_CONNECT, bool_text, indexed_keys,
    strip_tag,
};
use crate::model::{AuthMethod, IpAssignMode, MacAddress, Role, User};

/// Properties written when creating a user.
pub fn encode_create(user: &User) -> PropertyBag {
    let mut props = PropertyBag::new();
    props.insert_non_empty(PROP_EMAIL, &user.email);
    props.insert(PROP_AUTH_TYPE, user.auth_method.to_string());
    props.insert_non_empty(PROP_GROUP, &user.group_name);
    props.insert_non_empty(PROP_EXPIRATION, &user.user_expiration);
    props.insert_non_empty(PROP_CONN_IP, &user.ip_address);
    push_macs(&mut props, &user.mac_addresses);
    push_access(&mut props, &user.access_control);
    props.insert(PROP_TYPE, TYPE_USER_CONNECT);
    props.insert(PROP_MFA, bool_text(true));
    props
}

/// Properties written in the rewrite phase of an update.
pub fn encode_update(user: &User) -> PropertyBag {
    let mut props = PropertyBag::new();
    props.insert(PROP_EXPIRATION, user.user_expiration.as_str());
    props.insert(PROP_DENY, bool_text(user.deny_access));
    props.insert(PROP_GROUP, user.group_name.as_str());
    props.insert_non_empty(PROP_CONN_IP, &user.ip_address);
    push_macs(&mut props, &user.mac_addresses);
    push_access(&mut props, &user.access_control);
    props
}

/// Property names that must be deleted before rewriting `existing`.
///
/// The appliance cannot replace part of a multi-valued field, so every
/// slot the stored user occupies is cleared first.
///
/// With the stored bag at hand, the slots are read off its keys so that
/// gapped numbering left by other tools is cleared as well.
pub fn stale_properties(existing: &User, stored: Option<&PropertyBag>) -> Vec<String> {
    if let Some(stored) = stored {
        let mut names = stored.hw_addr_keys();
        names.extend(stored.indexed_keys(PROP_ACCESS));
        if stored.get(PROP_CONN_IP).is_some() {
            names.push(PROP_CONN_IP.to_string());
        }
        return names;
    }
    let mut names: Vec<String> = HW_ADDR_SLOTS
        .iter()
        .take(existing.mac_addresses.len())
        .map(|s| (*s).to_string())
        .collect();
    names.extend(indexed_keys(PROP_ACCESS, existing.access_control.len()));
    if !existing.ip_address.is_empty() {
        names.push(PROP_CONN_IP.to_string());
    }
    names
}

/// Single-property bag toggling access.
pub fn encode_deny(deny: bool) -> PropertyBag {
    let mut props = PropertyBag::new();
    props.insert(PROP_DENY, bool_text(deny));
    props
}

/// Rebuild a user from its stored properties.
///
/// The caller has already checked the kind marker. Absent properties take
/// the defaults: enabled, MFA on, role `User`.
pub fn decode(username: &str, props: &PropertyBag) -> User {
    let auth_method = props
        .get(PROP_AUTH_TYPE)
        .and_then(|v| v.parse().ok())
        .unwrap_or(AuthMethod::Local);

    let mac_addresses = props
        .hw_addrs()
        .into_iter()
        .filter_map(|raw| match MacAddress::parse(raw) {
            Ok(mac) => Some(mac),
            Err(e) => {
                warn!(username, error = %e, "skipping stored MAC address");
                None
            }
        })
        .collect();

    User {
        username: username.to_owned(),
        email: props.text(PROP_EMAIL).to_owned(),
        auth_method,
        group_name: props.text(PROP_GROUP).to_owned(),
        password: None,
        user_expiration: props.text(PROP_EXPIRATION).to_owned(),
        mac_addresses,
        mfa: props.flag(PROP_MFA).unwrap_or(true),
        role: decode_role(props),
        deny_access: props.flag(PROP_DENY).unwrap_or(false),
        access_control: props
            .indexed(PROP_ACCESS)
            .into_iter()
            .map(|e| strip_tag(e).to_owned())
            .collect(),
        ip_address: props.text(PROP_CONN_IP).to_owned(),
        ip_assign_mode: IpAssignMode::Dynamic,
    }
}

pub(crate) fn decode_role(props: &PropertyBag) -> Role {
    if props.get(PROP_SUPERUSER) == Some("true") {
        Role::Admin
    } else {
        Role::User
    }
}

fn push_macs(props: &mut PropertyBag, macs: &[MacAddress]) {
    let addrs: Vec<&str> = macs.iter().map(MacAddress::as_str).collect();
    props.push_hw_addrs(&addrs);
}

fn push_access(props: &mut PropertyBag, entries: &[String]) {
    let tagged: Vec<String> = entries.iter().map(|e| format!("{TAG_NAT}{e}")).collect();
    props.push_indexed(PROP_ACCESS, &tagged);
}
