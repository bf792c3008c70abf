// ── Core error types ──
//
// Errors surfaced by repositories and services. Remote failures keep the
// underlying `asadm_api::Error` as their source and add the operation and
// entity they were acting on. Validation failures are raised before any
// wire call is made.

use thiserror::Error;

/// Entity kind, used to label errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    User,
    Group,
    Config,
    Status,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote errors ────────────────────────────────────────────────
    #[error("{operation} failed for {target}: {source}")]
    Remote {
        operation: &'static str,
        target: String,
        #[source]
        source: asadm_api::Error,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{kind} not found: {identifier}")]
    NotFound {
        kind: EntityKind,
        identifier: String,
    },

    #[error("{kind} already exists: {identifier}")]
    AlreadyExists {
        kind: EntityKind,
        identifier: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    // ── Update errors ────────────────────────────────────────────────
    /// A phase of the two-phase update failed; a restore was attempted.
    #[error("Update of {entity} '{identifier}' failed: {cause}; restore {restore}")]
    PartialUpdate {
        entity: EntityKind,
        identifier: String,
        cause: Box<CoreError>,
        restore: RestoreOutcome,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Directory check failed for '{username}': {message}")]
    Directory { username: String, message: String },

    #[error("Operation rejected: {message}")]
    Rejected { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result of the compensating write after a failed delete phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    Failed(String),
}

impl std::fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Restored => f.write_str("succeeded"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

impl CoreError {
    /// Wrap a remote failure with its operation and target entity.
    pub fn remote(operation: &'static str, target: impl Into<String>, source: asadm_api::Error) -> Self {
        Self::Remote {
            operation,
            target: target.into(),
            source,
        }
    }

    pub fn not_found(kind: EntityKind, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            identifier: identifier.into(),
        }
    }

    pub fn already_exists(kind: EntityKind, identifier: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            identifier: identifier.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Input rejected before touching the appliance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    // ── Addressing ───────────────────────────────────────────────────
    #[error("subnet {subnet} overlaps {owner} ({conflict})")]
    SubnetOverlap {
        subnet: String,
        conflict: String,
        owner: String,
    },

    #[error("range {range} is not contained in any group subnet")]
    RangeOutsideSubnets { range: String },

    #[error("group range requires at least one group subnet")]
    RangeWithoutSubnet,

    #[error("invalid CIDR '{0}'")]
    InvalidCidr(String),

    #[error("invalid IP range '{value}': {reason}")]
    InvalidRange { value: String, reason: String },

    #[error("invalid IPv4 address '{0}'")]
    InvalidIp(String),

    #[error("IP {ip} is already assigned to {owner}")]
    IpInUse { ip: String, owner: String },

    #[error("IP {ip} is not inside any subnet of group {group}")]
    IpOutsideGroup { ip: String, group: String },

    #[error("IP {ip} falls inside reserved range {range}")]
    IpInReservedRange { ip: String, range: String },

    #[error("no free address left in group {group}")]
    NoFreeAddress { group: String },

    #[error("group {group} has no subnet to allocate from")]
    GroupWithoutSubnet { group: String },

    // ── Input formats ────────────────────────────────────────────────
    #[error("invalid MAC address '{0}'")]
    InvalidMac(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("invalid access control entry '{0}'")]
    InvalidAccessEntry(String),

    #[error("{0}")]
    PasswordPolicy(String),

    #[error("{field}: {message}")]
    Field { field: &'static str, message: String },
}
