//! Configuration for the asadm command line.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `asadm_core::ApplianceConfig`. The core crate never
//! reads files; it receives a finished `ApplianceConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use asadm_core::{ApplianceConfig, DEFAULT_PORT, TlsVerification};

/// Keyring service name under which profile passwords are stored.
pub const KEYRING_SERVICE: &str = "asadm";

/// Environment variable consulted after a profile's own `password_env`.
pub const PASSWORD_ENV: &str = "ASADM_PASSWORD";

const USERNAME_ENV: &str = "ASADM_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String, available: Vec<String> },

    #[error("no appliance host configured (expected a profile in {path})")]
    NoHost { path: PathBuf },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named appliance profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

/// A named appliance profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Appliance hostname or IP address.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Administrative account used for Basic Auth.
    pub username: Option<String>,

    /// Plaintext password. Prefer the keyring or `password_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,

    /// PEM bundle to trust instead of skipping verification.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    pub timeout: Option<u64>,
}

impl Config {
    /// Copy with plaintext passwords replaced, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for profile in copy.profiles.values_mut() {
            if profile.password.is_some() {
                profile.password = Some("********".into());
            }
        }
        copy
    }
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            password_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

/// Values supplied on the command line. Each one wins over the profile.
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub insecure: bool,
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "asadm", "asadm").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("asadm");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading and saving ──────────────────────────────────────────────

/// Defaults, then the TOML file, then `ASADM_`-prefixed environment.
///
/// Nested keys use a double underscore: `ASADM_DEFAULTS__TIMEOUT=60`.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ASADM_").split("__"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment_for(path).extract()?)
}

/// Load config, returning a default when the file is missing or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Credentials ─────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Store a profile password in the OS keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Resolve the password for a profile.
///
/// Order: the profile's `password_env`, then `ASADM_PASSWORD`, then the
/// OS keyring, then the plaintext value in the file.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |name| keyring_entry(name).and_then(|e| e.get_password()).ok(),
    )
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    if let Some(ref var) = profile.password_env {
        if let Some(pw) = env(var) {
            debug!(profile = profile_name, source = %var, "password from environment");
            return Ok(SecretString::from(pw));
        }
    }
    if let Some(pw) = env(PASSWORD_ENV) {
        debug!(profile = profile_name, source = PASSWORD_ENV, "password from environment");
        return Ok(SecretString::from(pw));
    }
    if let Some(pw) = keyring(profile_name) {
        debug!(profile = profile_name, "password from keyring");
        return Ok(SecretString::from(pw));
    }
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to ApplianceConfig ──────────────────────────────────

/// Pick the profile name: explicit flag, then the file's default.
pub fn active_profile_name(requested: Option<&str>, config: &Config) -> String {
    requested
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build an `ApplianceConfig` from a profile plus command-line overrides.
pub fn profile_to_appliance_config(
    profile: &Profile,
    profile_name: &str,
    overrides: &Overrides,
    defaults: &Defaults,
) -> Result<ApplianceConfig, ConfigError> {
    let host = overrides.host.as_deref().unwrap_or(&profile.host).trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }
    let port = overrides.port.unwrap_or(profile.port);
    if port == 0 {
        return Err(ConfigError::Validation {
            field: "port".into(),
            reason: "must be between 1 and 65535".into(),
        });
    }

    let username = overrides
        .username
        .clone()
        .or_else(|| profile.username.clone())
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    let password = match overrides.password {
        Some(ref pw) => pw.clone(),
        None => resolve_password(profile, profile_name)?,
    };

    let tls = tls_for(profile, overrides, defaults);
    let timeout = Duration::from_secs(
        overrides
            .timeout
            .or(profile.timeout)
            .unwrap_or(defaults.timeout),
    );

    Ok(ApplianceConfig {
        host: host.to_owned(),
        port,
        username,
        password,
        tls,
        timeout,
    })
}

// Appliances ship self-signed certificates, so verification is skipped
// unless a CA is configured or the profile opts out explicitly.
fn tls_for(profile: &Profile, overrides: &Overrides, defaults: &Defaults) -> TlsVerification {
    if overrides.insecure || profile.insecure.unwrap_or(defaults.insecure) {
        return TlsVerification::DangerAcceptInvalid;
    }
    match (&profile.ca_cert, profile.insecure) {
        (Some(ca), _) => TlsVerification::CustomCa(ca.clone()),
        (None, Some(false)) => TlsVerification::SystemDefaults,
        (None, _) => TlsVerification::DangerAcceptInvalid,
    }
}

/// Resolve the appliance to talk to.
///
/// A named profile is used when present. Without one, a `--host` override
/// is enough as long as credentials come from flags or the environment.
pub fn resolve_appliance(
    config: &Config,
    requested_profile: Option<&str>,
    overrides: &Overrides,
) -> Result<ApplianceConfig, ConfigError> {
    let name = active_profile_name(requested_profile, config);

    if let Some(profile) = config.profiles.get(&name) {
        return profile_to_appliance_config(profile, &name, overrides, &config.defaults);
    }
    if requested_profile.is_some() {
        return Err(ConfigError::ProfileNotFound {
            name,
            available: config.profiles.keys().cloned().collect(),
        });
    }

    let host = overrides.host.clone().ok_or_else(|| ConfigError::NoHost {
        path: config_path(),
    })?;
    profile_to_appliance_config(&Profile::new(host), &name, overrides, &config.defaults)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn with_password(name: &str, pw: &str) -> Profile {
        Profile {
            username: Some("openvpn".into()),
            password: Some(pw.into()),
            ..Profile::new(name)
        }
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "lab"

[defaults]
timeout = 45

[profiles.lab]
host = "vpn.lab.example"
username = "openvpn"
password_env = "LAB_VPN_PASSWORD"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert_eq!(cfg.defaults.timeout, 45);
        assert_eq!(cfg.defaults.output, "table");
        let lab = &cfg.profiles["lab"];
        assert_eq!(lab.port, 943);
        assert_eq!(lab.password_env.as_deref(), Some("LAB_VPN_PASSWORD"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.profiles.is_empty());
        assert_eq!(cfg.defaults.timeout, 30);
    }

    #[test]
    fn save_then_load_keeps_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                port: 8443,
                ..Profile::new("10.0.0.1")
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].host, "10.0.0.1");
        assert_eq!(loaded.profiles["default"].port, 8443);
    }

    #[test]
    fn redacted_hides_plaintext_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), with_password("h", "hunter2"));
        cfg.profiles.insert("bare".into(), Profile::new("h2"));
        let shown = cfg.redacted();
        assert_eq!(shown.profiles["lab"].password.as_deref(), Some("********"));
        assert_eq!(shown.profiles["bare"].password, None);
        assert_eq!(cfg.profiles["lab"].password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn password_resolution_order() {
        let mut profile = with_password("vpn", "plain");
        profile.password_env = Some("MY_PW".into());

        let env = |name: &str| match name {
            "MY_PW" => Some("from-named".to_string()),
            PASSWORD_ENV => Some("from-global".to_string()),
            _ => None,
        };
        let keyring = |_: &str| Some("from-keyring".to_string());

        let pw = resolve_password_with(&profile, "p", env, keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-named");

        let global_only = |name: &str| (name == PASSWORD_ENV).then(|| "from-global".to_string());
        let pw = resolve_password_with(&profile, "p", global_only, keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-global");

        let pw = resolve_password_with(&profile, "p", no_env, keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-keyring");

        let pw = resolve_password_with(&profile, "p", no_env, no_env).unwrap();
        assert_eq!(pw.expose_secret(), "plain");

        profile.password = None;
        assert!(matches!(
            resolve_password_with(&profile, "p", no_env, no_env),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn overrides_win_over_profile() {
        let profile = with_password("vpn.example.com", "pw");
        let overrides = Overrides {
            host: Some("10.1.1.1".into()),
            port: Some(9443),
            password: Some(SecretString::from("flag".to_string())),
            timeout: Some(5),
            ..Overrides::default()
        };
        let cfg =
            profile_to_appliance_config(&profile, "p", &overrides, &Defaults::default()).unwrap();
        assert_eq!(cfg.host, "10.1.1.1");
        assert_eq!(cfg.port, 9443);
        assert_eq!(cfg.username, "openvpn");
        assert_eq!(cfg.password.expose_secret(), "flag");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
    }

    #[test]
    fn tls_defaults_to_accepting_self_signed() {
        let defaults = Defaults::default();
        let none = Overrides::default();

        let mut profile = Profile::new("h");
        assert_eq!(
            tls_for(&profile, &none, &defaults),
            TlsVerification::DangerAcceptInvalid
        );

        profile.insecure = Some(false);
        assert_eq!(
            tls_for(&profile, &none, &defaults),
            TlsVerification::SystemDefaults
        );

        profile.ca_cert = Some(PathBuf::from("/etc/asadm/ca.pem"));
        assert_eq!(
            tls_for(&profile, &none, &defaults),
            TlsVerification::CustomCa(PathBuf::from("/etc/asadm/ca.pem"))
        );

        let insecure = Overrides {
            insecure: true,
            ..Overrides::default()
        };
        assert_eq!(
            tls_for(&profile, &insecure, &defaults),
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn port_zero_is_rejected() {
        let profile = Profile {
            port: 0,
            ..with_password("h", "pw")
        };
        let err = profile_to_appliance_config(&profile, "p", &Overrides::default(), &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "port"));
    }

    #[test]
    fn unknown_requested_profile_lists_available() {
        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), with_password("h", "pw"));
        let err = resolve_appliance(&cfg, Some("prod"), &Overrides::default()).unwrap_err();
        match err {
            ConfigError::ProfileNotFound { name, available } => {
                assert_eq!(name, "prod");
                assert_eq!(available, vec!["lab".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn host_flag_works_without_profile() {
        let overrides = Overrides {
            host: Some("vpn.example.com".into()),
            username: Some("admin".into()),
            password: Some(SecretString::from("pw".to_string())),
            ..Overrides::default()
        };
        let cfg = resolve_appliance(&Config::default(), None, &overrides).unwrap();
        assert_eq!(cfg.host, "vpn.example.com");
        assert_eq!(cfg.port, 943);
        assert_eq!(cfg.username, "admin");
    }

    #[test]
    fn no_profile_and_no_host_is_an_error() {
        let err = resolve_appliance(&Config::default(), None, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoHost { .. }));
    }
}
