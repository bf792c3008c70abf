// ── Runtime connection configuration ──
//
// Describes how to reach one appliance. Carries credentials and connection
// tuning but never touches disk; the CLI builds an `ApplianceConfig` from
// its profile and hands it in.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use asadm_api::{AsClient, TlsMode, Transport, TransportConfig};

use crate::error::CoreError;

/// Default administration port of the appliance's web service.
pub const DEFAULT_PORT: u16 = 943;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. The appliance ships a self-signed certificate.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single appliance.
#[derive(Debug, Clone)]
pub struct ApplianceConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Bounds each HTTP round trip.
    pub timeout: Duration,
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_PORT,
            username: "openvpn".into(),
            password: SecretString::from(String::new()),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ApplianceConfig {
    /// Build the shared XML-RPC client for this appliance.
    pub fn connect(&self) -> Result<Arc<AsClient>, CoreError> {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        let transport_config = TransportConfig {
            tls,
            timeout: self.timeout,
        };
        let transport = Transport::new(
            &self.host,
            self.port,
            self.username.clone(),
            self.password.clone(),
            &transport_config,
        )
        .map_err(|e| CoreError::Config {
            message: format!("cannot reach {}:{}: {e}", self.host, self.port),
        })?;
        Ok(Arc::new(AsClient::new(transport)))
    }
}
