// ── Appliance configuration snapshots ──
//
// Read-only views over the flat dotted-key configuration dump.

use serde::{Deserialize, Serialize};

/// Identity and listener settings of the appliance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub node_type: String,
    pub web_server_name: String,
    pub admin_port: String,
    pub admin_ip_address: String,
    pub client_port: String,
    pub client_ip_address: String,
    pub license_server: String,
    pub cluster_mode: String,
    pub failover_mode: String,
}

/// VPN network, daemon, routing and NAT settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    // Client network
    pub client_network: String,
    pub client_netmask_bits: String,
    pub group_pool: String,

    // Daemon
    pub tcp_port: String,
    pub udp_port: String,
    pub listen_ip: String,
    pub protocol: String,
    pub server_ip: String,

    // Performance
    pub mtu: String,
    pub mss_fix: String,
    pub osi_layer: String,

    // Routing
    pub reroute_gateway: bool,
    pub reroute_dns: bool,
    pub inter_client: bool,
    pub private_access: String,

    // NAT
    pub nat_enabled: bool,
    pub nat_masquerade: bool,
    pub nat6_enabled: bool,
    pub nat6_masquerade: bool,

    pub allow_private_nets_to_clients: bool,
    pub allow_private_nets6_to_clients: bool,
}

impl NetworkConfig {
    /// The client network as `network/bits`, when both halves are known.
    pub fn client_cidr(&self) -> Option<String> {
        if self.client_network.is_empty() || self.client_netmask_bits.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.client_network, self.client_netmask_bits))
    }
}
