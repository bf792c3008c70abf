// HTTP transport for the XML-RPC endpoint.
//
// One POST per call, Basic Auth attached every time, `text/xml` body.
// No retries and no status interpretation beyond handing it back.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (the appliance ships a self-signed one).
    DangerAcceptInvalid,
}

/// Settings used to build the underlying `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("asadm/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Status code and body of one round trip, before any XML-RPC decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Credentialed handle on the appliance's `/RPC2/` endpoint.
pub struct Transport {
    http: reqwest::Client,
    endpoint: Url,
    username: String,
    password: SecretString,
}

impl Transport {
    /// Build a transport from host/port plus credentials.
    ///
    /// The endpoint is always `https://{host}:{port}/RPC2/`.
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: SecretString,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let endpoint = endpoint_url(host, port)?;
        let http = config.build_client()?;
        Ok(Self {
            http,
            endpoint,
            username,
            password,
        })
    }

    /// Build a transport around a pre-built client and an explicit endpoint.
    ///
    /// Used by tests to point at a mock server over plain HTTP.
    pub fn with_client(
        http: reqwest::Client,
        endpoint: Url,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            endpoint,
            username,
            password,
        }
    }

    /// The `/RPC2/` URL every call is posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST one payload and return the raw status and body.
    ///
    /// Network and TLS failures surface as [`Error::Transport`]; the status
    /// code is returned untouched for the caller to judge.
    pub async fn call(&self, payload: String) -> Result<RawResponse, Error> {
        debug!(endpoint = %self.endpoint, bytes = payload.len(), "POST");
        trace!(%payload, "request body");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(payload)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        trace!(status, %body, "response body");

        Ok(RawResponse { status, body })
    }
}

/// `https://{host}:{port}/RPC2/`
pub fn endpoint_url(host: &str, port: u16) -> Result<Url, Error> {
    Ok(Url::parse(&format!("https://{host}:{port}/RPC2/"))?)
}
