//! Session status and disconnect handlers.

use tabled::Tabled;

use asadm_core::{ConnectedUser, VpnStatusSummary};

use crate::cli::{GlobalOpts, StatusArgs, StatusCommand};
use crate::error::CliError;
use crate::output;

use super::{Services, util};

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Real address")]
    real_address: String,
    #[tabled(rename = "VPN address")]
    virtual_address: String,
    #[tabled(rename = "Since")]
    since: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Rx")]
    received: u64,
    #[tabled(rename = "Tx")]
    sent: u64,
    #[tabled(rename = "Country")]
    country: String,
}

impl From<&ConnectedUser> for SessionRow {
    fn from(c: &ConnectedUser) -> Self {
        Self {
            username: c.username.clone(),
            real_address: c.real_address.clone(),
            virtual_address: c.virtual_address.clone(),
            since: c.connected_since.format("%Y-%m-%d %H:%M:%S").to_string(),
            duration: c.connection_duration.clone(),
            received: c.bytes_received,
            sent: c.bytes_sent,
            country: c.country.clone(),
        }
    }
}

fn summary_detail(s: &VpnStatusSummary) -> String {
    let header = output::detail_lines(&[
        ("Connected", s.total_connected_users.to_string()),
        ("As of", s.timestamp.to_rfc3339()),
    ]);
    if s.connected_users.is_empty() {
        return header;
    }
    let rows: Vec<SessionRow> = s.connected_users.iter().map(SessionRow::from).collect();
    format!(
        "{header}\n\n{}",
        tabled::Table::new(rows).with(tabled::settings::Style::rounded())
    )
}

pub async fn handle(services: &Services, args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        StatusCommand::List => {
            let sessions = services.status.connected_users().await?;
            let out = output::render_list(
                global.output,
                &sessions,
                |c| SessionRow::from(c),
                |c| c.username.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StatusCommand::Summary => {
            let summary = services.status.summary().await?;
            let out = output::render_single(global.output, &summary, summary_detail, |s| {
                s.total_connected_users.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StatusCommand::Check { username } => {
            if services.status.is_user_connected(&username).await? {
                output::print_output(&format!("{username} is connected"), global.quiet);
                Ok(())
            } else {
                Err(CliError::NotFound {
                    resource_type: "session".into(),
                    identifier: username,
                    list_command: "status list".into(),
                })
            }
        }
    }
}

pub async fn disconnect(
    services: &Services,
    usernames: &[String],
    message: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let names = usernames.join(", ");
    if !util::confirm(&format!("Disconnect {names}?"), global.yes)? {
        return Ok(());
    }
    services.status.disconnect_users(usernames, message).await?;
    output::done(global, &format!("Disconnected {names}"));
    Ok(())
}
