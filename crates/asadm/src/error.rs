//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use asadm_config::ConfigError;
use asadm_core::{CoreError, RestoreOutcome, ValidationError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PARTIAL: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the appliance ({operation} on {target})")]
    #[diagnostic(
        code(asadm::connection_failed),
        help(
            "Check that the appliance is running and the admin port is reachable.\n\
             Try: asadm server info --insecure"
        )
    )]
    ConnectionFailed {
        operation: String,
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(asadm::tls_error),
        help(
            "Use --insecure (-k) to accept a self-signed certificate,\n\
             or set ca_cert in your profile."
        )
    )]
    TlsError { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(asadm::auth_failed),
        help(
            "Verify the administrative username and password.\n\
             Run: asadm config set-password"
        )
    )]
    AuthFailed,

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(asadm::no_credentials),
        help(
            "Configure credentials with: asadm config init\n\
             Or set ASADM_USERNAME and ASADM_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(asadm::not_found),
        help("Run: asadm {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(asadm::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    #[error("Update of {resource_type} '{identifier}' failed: {cause}")]
    #[diagnostic(code(asadm::partial_update), help("{restore_help}"))]
    PartialUpdate {
        resource_type: String,
        identifier: String,
        cause: String,
        restore_help: String,
    },

    // ── Appliance ────────────────────────────────────────────────────
    #[error("Appliance error ({code}): {message}")]
    #[diagnostic(code(asadm::api_error))]
    ApiError { code: String, message: String },

    #[error("Operation rejected: {message}")]
    #[diagnostic(code(asadm::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(asadm::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(asadm::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: asadm config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No appliance configured")]
    #[diagnostic(
        code(asadm::no_config),
        help(
            "Create a profile with: asadm config init\n\
             Or pass --host. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("{0}")]
    #[diagnostic(code(asadm::config))]
    Config(String),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(asadm::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("{operation} timed out")]
    #[diagnostic(
        code(asadm::timeout),
        help("Increase the timeout with --timeout or check the appliance's load.")
    )]
    Timeout { operation: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(asadm::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::PartialUpdate { .. } => exit_code::PARTIAL,
            Self::Rejected { .. } => exit_code::PERMISSION,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Remote {
                operation,
                target,
                source,
            } => from_remote(operation, target, source),

            CoreError::NotFound { kind, identifier } => CliError::NotFound {
                list_command: format!("{kind}s list"),
                resource_type: kind.to_string(),
                identifier,
            },

            CoreError::AlreadyExists { kind, identifier } => CliError::Conflict {
                resource_type: kind.to_string(),
                identifier,
            },

            CoreError::Validation(v) => from_validation(&v),

            CoreError::PartialUpdate {
                entity,
                identifier,
                cause,
                restore,
            } => CliError::PartialUpdate {
                resource_type: entity.to_string(),
                restore_help: match restore {
                    RestoreOutcome::Restored => {
                        "The previous state was written back; nothing changed.".into()
                    }
                    RestoreOutcome::Failed(reason) => format!(
                        "Restoring the previous state also failed ({reason}).\n\
                         Inspect it with: asadm {entity}s get {identifier}"
                    ),
                },
                identifier,
                cause: cause.to_string(),
            },

            CoreError::Directory { username, message } => CliError::ApiError {
                code: "directory".into(),
                message: format!("{username}: {message}"),
            },

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::Config { message } => CliError::Config(message),
        }
    }
}

fn from_remote(operation: &str, target: String, source: asadm_api::Error) -> CliError {
    match source {
        asadm_api::Error::Status { status: 401 | 403, .. } => CliError::AuthFailed,
        asadm_api::Error::Transport(ref e) if e.is_timeout() => CliError::Timeout {
            operation: operation.to_owned(),
        },
        asadm_api::Error::Transport(e) => CliError::ConnectionFailed {
            operation: operation.to_owned(),
            target,
            source: Box::new(e),
        },
        asadm_api::Error::Tls(message) => CliError::TlsError { message },
        asadm_api::Error::Fault { code, message } => CliError::ApiError {
            code: code.to_string(),
            message,
        },
        other => CliError::ApiError {
            code: operation.to_owned(),
            message: other.to_string(),
        },
    }
}

fn from_validation(err: &ValidationError) -> CliError {
    let field = match err {
        ValidationError::Field { field, .. } => (*field).to_owned(),
        ValidationError::SubnetOverlap { .. }
        | ValidationError::RangeOutsideSubnets { .. }
        | ValidationError::RangeWithoutSubnet => "subnet".into(),
        _ => "input".into(),
    };
    let reason = match err {
        ValidationError::Field { message, .. } => message.clone(),
        other => other.to_string(),
    };
    CliError::Validation { field, reason }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound { name, available } => CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            ConfigError::NoHost { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use asadm_core::EntityKind;

    use super::*;

    #[test]
    fn not_found_points_at_list_command() {
        let err = CliError::from(CoreError::not_found(EntityKind::Group, "eng"));
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "groups list"),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn unauthorized_status_is_auth_failure() {
        let err = CliError::from(CoreError::remote(
            "UserPropMultiGet",
            "*",
            asadm_api::Error::Status {
                status: 401,
                body: String::new(),
            },
        ));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn validation_keeps_field_name() {
        let err = CliError::from(CoreError::Validation(ValidationError::Field {
            field: "days",
            message: "must be between 0 and 365".into(),
        }));
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "days"));
    }

    #[test]
    fn missing_host_is_no_config() {
        let err = CliError::from(ConfigError::NoHost {
            path: "/tmp/config.toml".into(),
        });
        assert!(matches!(err, CliError::NoConfig { .. }));
    }
}
