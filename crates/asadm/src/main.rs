mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use asadm_config::Overrides;
use asadm_core::ApplianceConfig;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::commands::Services;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need an appliance connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "asadm", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let appliance = build_appliance_config(&cli.global)?;
            tracing::debug!(host = %appliance.host, port = appliance.port, "connecting");
            let services = Services::connect(&appliance)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &services, &cli.global).await
        }
    }
}

/// Build an `ApplianceConfig` from the config file, profile, and CLI overrides.
fn build_appliance_config(global: &GlobalOpts) -> Result<ApplianceConfig, CliError> {
    let cfg = asadm_config::load_config_or_default();
    let overrides = Overrides {
        host: global.host.clone(),
        port: global.port,
        username: global.username.clone(),
        password: None,
        insecure: global.insecure,
        timeout: global.timeout,
    };
    Ok(asadm_config::resolve_appliance(
        &cfg,
        global.profile.as_deref(),
        &overrides,
    )?)
}
