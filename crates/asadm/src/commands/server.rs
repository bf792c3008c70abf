//! Server command handlers.

use asadm_core::{NetworkConfig, ServerInfo};

use crate::cli::{GlobalOpts, ServerArgs, ServerCommand};
use crate::error::CliError;
use crate::output;

use super::{Services, util};

fn info_detail(s: &ServerInfo) -> String {
    output::detail_lines(&[
        ("Node type", output::or_dash(&s.node_type)),
        ("Web server", output::or_dash(&s.web_server_name)),
        ("Admin", format!("{}:{}", s.admin_ip_address, s.admin_port)),
        ("Client", format!("{}:{}", s.client_ip_address, s.client_port)),
        ("License server", output::or_dash(&s.license_server)),
        ("Cluster mode", output::or_dash(&s.cluster_mode)),
        ("Failover mode", output::or_dash(&s.failover_mode)),
    ])
}

fn network_detail(n: &NetworkConfig) -> String {
    output::detail_lines(&[
        ("Client network", n.client_cidr().unwrap_or_else(|| "-".into())),
        ("Group pool", output::or_dash(&n.group_pool)),
        ("Protocol", output::or_dash(&n.protocol)),
        ("TCP port", output::or_dash(&n.tcp_port)),
        ("UDP port", output::or_dash(&n.udp_port)),
        ("Listen IP", output::or_dash(&n.listen_ip)),
        ("MTU", output::or_dash(&n.mtu)),
        ("Reroute gateway", output::yes_no(n.reroute_gateway)),
        ("Reroute DNS", output::yes_no(n.reroute_dns)),
        ("Inter-client", output::yes_no(n.inter_client)),
        ("Private access", output::or_dash(&n.private_access)),
        ("NAT", output::yes_no(n.nat_enabled)),
    ])
}

pub async fn handle(services: &Services, args: ServerArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ServerCommand::Info => {
            let info = services.status.server_info().await?;
            let out = output::render_single(global.output, &info, info_detail, |s| {
                s.node_type.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ServerCommand::Network => {
            let network = services.status.network_config().await?;
            let out = output::render_single(global.output, &network, network_detail, |n| {
                n.client_cidr().unwrap_or_default()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ServerCommand::Restart => {
            if !util::confirm(
                "Warm-restart the VPN services? Connected users will reconnect.",
                global.yes,
            )? {
                return Ok(());
            }
            services.status.restart().await?;
            output::done(global, "VPN services restarting");
            Ok(())
        }
    }
}
