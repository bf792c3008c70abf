// ── Configuration codec ──
//
// Picks a fixed whitelist of keys out of the flat configuration dump.

use indexmap::IndexMap;

use crate::model::{NetworkConfig, ServerInfo};

fn text(config: &IndexMap<String, String>, key: &str) -> String {
    config.get(key).cloned().unwrap_or_default()
}

/// Exactly `"true"` or `"1"`.
fn flag(config: &IndexMap<String, String>, key: &str) -> bool {
    config.get(key).is_some_and(|v| v == "true" || v == "1")
}

pub fn decode_server_info(config: &IndexMap<String, String>) -> ServerInfo {
    ServerInfo {
        node_type: text(config, "node_type"),
        web_server_name: text(config, "cs.web_server_name"),
        admin_port: text(config, "admin_ui.https.port"),
        admin_ip_address: text(config, "admin_ui.https.ip_address"),
        client_port: text(config, "cs.https.port"),
        client_ip_address: text(config, "cs.https.ip_address"),
        license_server: text(config, "lic.server"),
        cluster_mode: text(config, "cluster.mode"),
        failover_mode: text(config, "failover.mode"),
    }
}

pub fn decode_network_config(config: &IndexMap<String, String>) -> NetworkConfig {
    NetworkConfig {
        client_network: text(config, "vpn.daemon.0.client.network"),
        client_netmask_bits: text(config, "vpn.daemon.0.client.netmask_bits"),
        group_pool: text(config, "vpn.server.group_pool.0"),

        tcp_port: text(config, "vpn.server.daemon.tcp.port"),
        udp_port: text(config, "vpn.server.daemon.udp.port"),
        listen_ip: text(config, "vpn.daemon.0.listen.ip_address"),
        protocol: text(config, "vpn.daemon.0.listen.protocol"),
        server_ip: text(config, "vpn.daemon.0.server.ip_address"),

        mtu: text(config, "vpn.general.mtu"),
        mss_fix: text(config, "vpn.server.mssfix"),
        osi_layer: text(config, "vpn.general.osi_layer"),

        reroute_gateway: flag(config, "vpn.client.routing.reroute_gw"),
        reroute_dns: flag(config, "vpn.client.routing.reroute_dns"),
        inter_client: flag(config, "vpn.client.routing.inter_client"),
        private_access: text(config, "vpn.server.routing.private_access"),

        nat_enabled: flag(config, "vpn.server.nat"),
        nat_masquerade: flag(config, "vpn.server.nat.masquerade"),
        nat6_enabled: flag(config, "vpn.server.nat6"),
        nat6_masquerade: flag(config, "vpn.server.nat6.masquerade"),

        allow_private_nets_to_clients: flag(
            config,
            "vpn.server.routing.allow_private_nets_to_clients",
        ),
        allow_private_nets6_to_clients: flag(
            config,
            "vpn.server.routing6.allow_private_nets_to_clients",
        ),
    }
}
