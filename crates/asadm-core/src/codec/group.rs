// ── Group codec ──

use asadm_api::PropertyBag;

use super::{
    PROP_ACCESS, PROP_AUTH_TYPE, PROP_DENY, PROP_GROUP_DECLARE, PROP_MFA, PROP_RANGES,
    PROP_SUBNETS, PROP_SUPERUSER, PROP_TYPE, TAG_SUBNET, TYPE_GROUP, bool_text, indexed_keys,
    strip_tag, user::decode_role,
};
use crate::model::{AuthMethod, Group, Role};

/// Properties written when creating a group.
pub fn encode_create(group: &Group) -> PropertyBag {
    let mut props = PropertyBag::new();
    props.insert(PROP_AUTH_TYPE, group.auth_method.to_string());
    push_lists(&mut props, group);
    props.insert(PROP_TYPE, TYPE_GROUP);
    props.insert(PROP_GROUP_DECLARE, bool_text(true));
    props.insert(PROP_MFA, bool_text(group.mfa));
    props.insert(PROP_SUPERUSER, bool_text(group.role == Role::Admin));
    props
}

/// Properties written in the rewrite phase of an update.
pub fn encode_update(group: &Group) -> PropertyBag {
    let mut props = PropertyBag::new();
    push_lists(&mut props, group);
    props.insert(PROP_MFA, bool_text(group.mfa));
    props.insert(PROP_SUPERUSER, bool_text(group.role == Role::Admin));
    props.insert(PROP_DENY, bool_text(group.deny_access));
    props
}

/// Indexed property names `existing` occupies, taken from the stored bag
/// when there is one.
pub fn stale_properties(existing: &Group, stored: Option<&PropertyBag>) -> Vec<String> {
    if let Some(stored) = stored {
        return [PROP_ACCESS, PROP_SUBNETS, PROP_RANGES]
            .iter()
            .flat_map(|base| stored.indexed_keys(base))
            .collect();
    }
    indexed_keys(PROP_ACCESS, existing.access_control.len())
        .chain(indexed_keys(PROP_SUBNETS, existing.group_subnet.len()))
        .chain(indexed_keys(PROP_RANGES, existing.group_range.len()))
        .collect()
}

/// Names of the access entries to drop when clearing access control.
pub fn access_properties(existing: &Group, stored: Option<&PropertyBag>) -> Vec<String> {
    match stored {
        Some(stored) => stored.indexed_keys(PROP_ACCESS),
        None => indexed_keys(PROP_ACCESS, existing.access_control.len()).collect(),
    }
}

/// Rebuild a group from its stored properties.
pub fn decode(group_name: &str, props: &PropertyBag) -> Group {
    Group {
        group_name: group_name.to_owned(),
        auth_method: props
            .get(PROP_AUTH_TYPE)
            .and_then(|v| v.parse().ok())
            .unwrap_or(AuthMethod::Local),
        mfa: props.flag(PROP_MFA).unwrap_or(true),
        role: decode_role(props),
        deny_access: props.flag(PROP_DENY).unwrap_or(false),
        access_control: props
            .indexed(PROP_ACCESS)
            .into_iter()
            .map(|e| strip_tag(e).to_owned())
            .collect(),
        group_subnet: owned(props.indexed(PROP_SUBNETS)),
        group_range: owned(props.indexed(PROP_RANGES)),
    }
}

fn push_lists(props: &mut PropertyBag, group: &Group) {
    let tagged: Vec<String> = group
        .access_control
        .iter()
        .map(|e| format!("{TAG_SUBNET}{e}"))
        .collect();
    props.push_indexed(PROP_ACCESS, &tagged);
    props.push_indexed(PROP_SUBNETS, &group.group_subnet);
    props.push_indexed(PROP_RANGES, &group.group_range);
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_owned).collect()
}
