//! Bulk command handlers.

use tabled::Tabled;

use asadm_core::{BulkOperation, BulkStatus, Group, NewUser};

use crate::cli::{BulkArgs, BulkCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Services, util};

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Result")]
    result: String,
}

fn detail(op: &BulkOperation) -> String {
    let header = output::detail_lines(&[
        ("Operation", op.id.to_string()),
        ("Action", format!("{} {}", op.action, op.kind)),
        ("Status", op.status.to_string()),
        (
            "Processed",
            format!("{}/{} ({} failed)", op.processed(), op.total, op.failed),
        ),
    ]);
    if op.results.is_empty() {
        return header;
    }
    let rows: Vec<ItemRow> = op
        .results
        .iter()
        .map(|r| ItemRow {
            name: r.name.clone(),
            result: match &r.error {
                Some(e) => e.clone(),
                None => "ok".into(),
            },
        })
        .collect();
    format!(
        "{header}\n\n{}",
        tabled::Table::new(rows).with(tabled::settings::Style::rounded())
    )
}

pub async fn handle(services: &Services, args: BulkArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let runner = services.bulk(args.concurrency);
    let op = match args.command {
        BulkCommand::CreateUsers { file } => {
            let inputs: Vec<NewUser> = util::read_json_file(&file)?;
            runner.create_users(inputs).await
        }
        BulkCommand::CreateGroups { file } => {
            let groups: Vec<Group> = util::read_json_file(&file)?;
            runner.create_groups(groups).await
        }
        BulkCommand::Users { action, usernames } => {
            if !util::confirm(
                &format!("Apply {action} to {} users?", usernames.len()),
                global.yes,
            )? {
                return Ok(());
            }
            runner.user_action(action, usernames).await?
        }
        BulkCommand::Groups { action, names } => {
            if !util::confirm(
                &format!("Apply {action} to {} groups?", names.len()),
                global.yes,
            )? {
                return Ok(());
            }
            runner.group_action(action, names).await?
        }
    };

    let out = output::render_single(global.output, &op, detail, |o| o.id.to_string())?;
    output::print_output(&out, global.quiet);

    if op.status == BulkStatus::Failed {
        return Err(CliError::Rejected {
            message: format!("bulk {} {}: every item failed", op.action, op.kind),
        });
    }
    Ok(())
}
