// ── Property-bag codecs ──
//
// One bidirectional codec per entity kind. Encoders turn typed entities
// into the flat property bags the appliance stores; decoders rebuild
// typed entities from them. Wire strings (`"true"`, `"Admin"`, tagged
// access entries) exist only inside this module.

pub mod group;
pub mod server;
pub mod status;
pub mod user;

use asadm_api::PropertyBag;

// ── Property names ──────────────────────────────────────────────────

pub(crate) const PROP_TYPE: &str = "type";
pub(crate) const PROP_EMAIL: &str = "email";
pub(crate) const PROP_AUTH_TYPE: &str = "user_auth_type";
pub(crate) const PROP_GROUP: &str = "conn_group";
pub(crate) const PROP_EXPIRATION: &str = "user_expiration";
pub(crate) const PROP_CONN_IP: &str = "conn_ip";
pub(crate) const PROP_ACCESS: &str = "access_to";
pub(crate) const PROP_SUBNETS: &str = "group_subnets";
pub(crate) const PROP_RANGES: &str = "group_range";
pub(crate) const PROP_GROUP_DECLARE: &str = "group_declare";
pub(crate) const PROP_MFA: &str = "prop_google_auth";
pub(crate) const PROP_DENY: &str = "prop_deny";
pub(crate) const PROP_SUPERUSER: &str = "prop_superuser";

/// Kind marker values.
pub(crate) const TYPE_USER_CONNECT: &str = "user_connect";
pub(crate) const TYPE_USER_COMPILE: &str = "user_compile";
pub(crate) const TYPE_GROUP: &str = "group";

/// Access-entry tags.
pub(crate) const TAG_NAT: &str = "+NAT:";
pub(crate) const TAG_SUBNET: &str = "+SUBNET:";

/// What a property bag claims to be, per its `type` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    User,
    Group,
}

/// Classify a bag by its `type` marker. Unrecognized or missing markers
/// belong to neither domain.
pub fn kind_of(props: &PropertyBag) -> Option<ProfileKind> {
    match props.get(PROP_TYPE)? {
        TYPE_USER_CONNECT | TYPE_USER_COMPILE => Some(ProfileKind::User),
        TYPE_GROUP => Some(ProfileKind::Group),
        _ => None,
    }
}

pub(crate) fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Remove a leading `+TAG:` from an access entry.
pub(crate) fn strip_tag(entry: &str) -> &str {
    [TAG_NAT, TAG_SUBNET]
        .iter()
        .find_map(|tag| entry.strip_prefix(tag))
        .unwrap_or(entry)
}

/// Keys `base.0 .. base.{count-1}`.
pub(crate) fn indexed_keys(base: &str, count: usize) -> impl Iterator<Item = String> + '_ {
    (0..count).map(move |i| format!("{base}.{i}"))
}
