use thiserror::Error;

/// Top-level error type for the `asadm-api` crate.
///
/// Covers every failure mode of a single XML-RPC exchange with the
/// appliance: building the HTTP client, the round trip itself, a non-200
/// status, an appliance-reported fault, and a response that could not be
/// understood. `asadm-core` wraps these with entity and operation context.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// The endpoint answered with something other than 200 OK.
    #[error("Unexpected HTTP status {status}")]
    Status { status: u16, body: String },

    // ── Protocol ────────────────────────────────────────────────────
    /// The appliance returned a `<fault>` response.
    #[error("Appliance fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// The body was not a recognizable `methodResponse`.
    #[error("Malformed XML-RPC response: {message}")]
    Malformed { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Nothing in this crate retries; callers decide.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the appliance itself rejected the call.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }

    /// Returns `true` if the fault text says the target entity is missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Fault { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("not found") || lower.contains("does not exist")
            }
            _ => false,
        }
    }

    /// Extract the appliance fault code, if available.
    pub fn fault_code(&self) -> Option<i64> {
        match self {
            Self::Fault { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detection_is_case_insensitive() {
        let err = Error::Fault {
            code: 1,
            message: "User Not Found: ghost".into(),
        };
        assert!(err.is_not_found());
        assert!(err.is_fault());
        assert_eq!(err.fault_code(), Some(1));
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Status {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_transient());
        let err = Error::Status {
            status: 401,
            body: String::new(),
        };
        assert!(!err.is_transient());
    }
}
