// ── Live session types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One connected VPN client, as reported by a daemon's client list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedUser {
    pub common_name: String,
    /// Public address without the port.
    pub real_address: String,
    pub virtual_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub virtual_ipv6_address: String,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub connected_since: DateTime<Utc>,
    pub connected_since_unix: i64,
    pub username: String,
    pub client_id: String,
    pub peer_id: String,
    pub data_channel_cipher: String,
    /// `"Local"` for private addresses, otherwise `"Unknown"`.
    pub country: String,
    /// Human duration such as `1h2m3s`.
    pub connection_duration: String,
}

/// Snapshot of every session across all daemons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnStatusSummary {
    pub total_connected_users: usize,
    pub connected_users: Vec<ConnectedUser>,
    pub timestamp: DateTime<Utc>,
}
