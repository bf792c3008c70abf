//! Group command handlers.

use tabled::Tabled;

use asadm_core::{Group, GroupFilter, GroupUpdate};

use crate::cli::{GlobalOpts, GroupCreateArgs, GroupUpdateArgs, GroupsArgs, GroupsCommand};
use crate::error::CliError;
use crate::output;

use super::{Services, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Auth")]
    auth: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "MFA")]
    mfa: String,
    #[tabled(rename = "Subnets")]
    subnets: String,
    #[tabled(rename = "Ranges")]
    ranges: String,
}

impl From<&Group> for GroupRow {
    fn from(g: &Group) -> Self {
        Self {
            name: g.group_name.clone(),
            auth: g.auth_method.to_string(),
            role: g.role.to_string(),
            enabled: output::yes_no(g.is_enabled()),
            mfa: output::yes_no(g.mfa),
            subnets: output::or_dash(&g.group_subnet.join(", ")),
            ranges: output::or_dash(&g.group_range.join(", ")),
        }
    }
}

fn detail(g: &Group) -> String {
    output::detail_lines(&[
        ("Name", g.group_name.clone()),
        ("Auth", g.auth_method.to_string()),
        ("Role", g.role.to_string()),
        ("Enabled", output::yes_no(g.is_enabled())),
        ("MFA", output::yes_no(g.mfa)),
        ("Subnets", output::or_dash(&g.group_subnet.join(", "))),
        ("Ranges", output::or_dash(&g.group_range.join(", "))),
        ("Access", output::or_dash(&g.access_control.join(", "))),
    ])
}

fn group_from(args: GroupCreateArgs) -> Group {
    Group {
        role: args.role,
        mfa: args.mfa,
        access_control: args.access,
        group_subnet: args.subnets,
        group_range: args.ranges,
        ..Group::new(args.name, args.auth)
    }
}

fn update_from(args: GroupUpdateArgs) -> GroupUpdate {
    GroupUpdate {
        mfa: args.mfa,
        role: args.role,
        deny_access: args.deny,
        access_control: args.access,
        group_subnet: args.subnets,
        group_range: args.ranges,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(services: &Services, args: GroupsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let groups = &services.groups;
    match args.command {
        GroupsCommand::List {
            name,
            auth,
            role,
            enabled,
            paging,
        } => {
            let filter = GroupFilter {
                group_name: name,
                auth_method: auth,
                role,
                is_enabled: enabled,
                page: Some(paging.page),
                limit: Some(paging.limit),
            };
            let page = groups.list(&filter).await?;
            let out = output::render_list(
                global.output,
                &page.items,
                |g| GroupRow::from(g),
                |g| g.group_name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Get { name } => {
            let group = groups.get(&name).await?;
            let out =
                output::render_single(global.output, &group, detail, |g| g.group_name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Create(create_args) => {
            let created = groups.create(group_from(create_args)).await?;
            output::done(global, &format!("Group '{}' created", created.group_name));
            let out =
                output::render_single(global.output, &created, detail, |g| g.group_name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Update(update_args) => {
            let name = update_args.name.clone();
            let updated = groups.update(&name, update_from(update_args)).await?;
            output::done(global, &format!("Group '{name}' updated"));
            let out =
                output::render_single(global.output, &updated, detail, |g| g.group_name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Delete { name } => {
            if !util::confirm(&format!("Delete group '{name}'?"), global.yes)? {
                return Ok(());
            }
            groups.delete(&name).await?;
            output::done(global, &format!("Group '{name}' deleted"));
            Ok(())
        }

        GroupsCommand::Enable { name } => {
            groups.enable(&name).await?;
            output::done(global, &format!("Group '{name}' enabled"));
            Ok(())
        }

        GroupsCommand::Disable { name } => {
            groups.disable(&name).await?;
            output::done(global, &format!("Group '{name}' disabled"));
            Ok(())
        }

        GroupsCommand::ClearAccess { name } => {
            if !util::confirm(
                &format!("Remove every access-control entry from '{name}'?"),
                global.yes,
            )? {
                return Ok(());
            }
            groups.clear_access_control(&name).await?;
            output::done(global, &format!("Access control cleared for '{name}'"));
            Ok(())
        }
    }
}
