//! User command handlers.

use tabled::Tabled;

use asadm_core::{
    AuthMethod, ExpirationEntry, ExpirationStatus, NewUser, User, UserFilter, UserUpdate,
};

use crate::cli::{
    GlobalOpts, OutputFormat, UserCreateArgs, UserListArgs, UserUpdateArgs, UsersArgs,
    UsersCommand,
};
use crate::error::CliError;
use crate::output;

use super::{Services, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Auth")]
    auth: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "MFA")]
    mfa: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "IP")]
    ip: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            username: u.username.clone(),
            email: output::or_dash(&u.email),
            auth: u.auth_method.to_string(),
            group: output::or_dash(&u.group_name),
            role: u.role.to_string(),
            enabled: output::yes_no(u.is_enabled()),
            mfa: output::yes_no(u.mfa),
            expires: output::or_dash(&u.user_expiration),
            ip: output::or_dash(&u.ip_address),
        }
    }
}

#[derive(Tabled)]
struct ExpirationRow {
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Days")]
    days: i64,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&ExpirationEntry> for ExpirationRow {
    fn from(e: &ExpirationEntry) -> Self {
        Self {
            username: e.username.clone(),
            email: output::or_dash(&e.email),
            expires: e.user_expiration.clone(),
            days: e.days_until_expiry,
            status: e.status.to_string(),
        }
    }
}

fn detail(u: &User) -> String {
    let macs: Vec<&str> = u.mac_addresses.iter().map(|m| m.as_str()).collect();
    output::detail_lines(&[
        ("Username", u.username.clone()),
        ("Email", output::or_dash(&u.email)),
        ("Auth", u.auth_method.to_string()),
        ("Group", output::or_dash(&u.group_name)),
        ("Role", u.role.to_string()),
        ("Enabled", output::yes_no(u.is_enabled())),
        ("MFA", output::yes_no(u.mfa)),
        ("Expires", output::or_dash(&u.user_expiration)),
        ("IP", output::or_dash(&u.ip_address)),
        ("IP mode", u.ip_assign_mode.to_string()),
        ("MACs", output::or_dash(&macs.join(", "))),
        ("Access", output::or_dash(&u.access_control.join(", "))),
    ])
}

// ── Argument translation ────────────────────────────────────────────

fn filter_from(args: UserListArgs) -> UserFilter {
    UserFilter {
        username: args.username,
        email: args.email,
        auth_method: args.auth,
        role: args.role,
        group_name: args.group,
        is_enabled: args.enabled,
        deny_access: args.deny,
        mfa_enabled: args.mfa,
        user_expiration_after: args.expires_after,
        user_expiration_before: args.expires_before,
        include_expired: args.include_expired,
        expiring_in_days: args.expiring_in,
        has_access_control: args.has_access_control,
        mac_address: args.mac,
        ip_address: args.ip,
        search_text: args.search,
        sort_by: args.sort,
        sort_order: args.order,
        page: Some(args.paging.page),
        limit: Some(args.paging.limit),
        exact_match: args.exact,
        case_sensitive: args.case_sensitive,
    }
}

fn update_from(args: UserUpdateArgs) -> UserUpdate {
    UserUpdate {
        user_expiration: args.expiration,
        deny_access: args.deny,
        group_name: args.group,
        mac_addresses: if args.clear_macs {
            Some(Vec::new())
        } else {
            args.macs
        },
        access_control: if args.clear_access {
            Some(Vec::new())
        } else {
            args.access
        },
        ip_address: args.ip,
        ip_assign_mode: args.ip_mode,
    }
}

fn new_user_from(args: UserCreateArgs) -> Result<NewUser, CliError> {
    let password = if args.auth == AuthMethod::Local {
        Some(util::password_or_prompt(
            args.password,
            &format!("Password for {}", args.username),
        )?)
    } else {
        args.password
    };
    Ok(NewUser {
        username: args.username,
        email: args.email,
        auth_method: args.auth,
        group_name: args.group.unwrap_or_default(),
        password,
        user_expiration: args.expiration.unwrap_or_default(),
        mac_addresses: args.macs,
        access_control: args.access,
        ip_address: args.ip.unwrap_or_default(),
        ip_assign_mode: args.ip_mode,
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(services: &Services, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let users = &services.users;
    match args.command {
        UsersCommand::List(list_args) => {
            let page = users.list(&filter_from(list_args)).await?;
            let out = output::render_list(
                global.output,
                &page.items,
                |u| UserRow::from(u),
                |u| u.username.clone(),
            )?;
            output::print_output(&out, global.quiet);
            if matches!(global.output, OutputFormat::Table) && !global.quiet {
                eprintln!(
                    "page {} · {} of {} users",
                    page.page,
                    page.items.len(),
                    page.total
                );
            }
            Ok(())
        }

        UsersCommand::Get { username } => {
            let user = users.get(&username).await?;
            let out = output::render_single(global.output, &user, detail, |u| u.username.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Create(create_args) => {
            let created = users.create(new_user_from(create_args)?).await?;
            output::done(global, &format!("User '{}' created", created.username));
            let out =
                output::render_single(global.output, &created, detail, |u| u.username.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Update(update_args) => {
            let username = update_args.username.clone();
            let updated = users.update(&username, update_from(update_args)).await?;
            output::done(global, &format!("User '{username}' updated"));
            let out =
                output::render_single(global.output, &updated, detail, |u| u.username.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Delete { username } => {
            if !util::confirm(&format!("Delete user '{username}'?"), global.yes)? {
                return Ok(());
            }
            users.delete(&username).await?;
            output::done(global, &format!("User '{username}' deleted"));
            Ok(())
        }

        UsersCommand::Enable { username } => {
            users.enable(&username).await?;
            output::done(global, &format!("User '{username}' enabled"));
            Ok(())
        }

        UsersCommand::Disable { username } => {
            users.disable(&username).await?;
            output::done(global, &format!("User '{username}' disabled"));
            Ok(())
        }

        UsersCommand::Password { username, password } => {
            let password =
                util::password_or_prompt(password, &format!("New password for {username}"))?;
            users.change_password(&username, &password).await?;
            output::done(global, &format!("Password changed for '{username}'"));
            Ok(())
        }

        UsersCommand::Totp { username } => {
            if !util::confirm(
                &format!("Regenerate the TOTP secret for '{username}'?"),
                global.yes,
            )? {
                return Ok(());
            }
            users.regenerate_totp(&username).await?;
            output::done(global, &format!("TOTP secret regenerated for '{username}'"));
            Ok(())
        }

        UsersCommand::Expiring { days, emails } => {
            if emails {
                let list = users.expiring_emails(days).await?;
                output::print_output(&list.join("\n"), global.quiet);
                return Ok(());
            }
            let report = users.expirations(days).await?;
            let out = output::render_list(
                global.output,
                &report,
                |e| ExpirationRow::from(e),
                |e| e.username.clone(),
            )?;
            output::print_output(&out, global.quiet);
            if matches!(global.output, OutputFormat::Table) && !global.quiet {
                eprintln!("{}", status_tally(&report, output::should_color(global.color)));
            }
            Ok(())
        }
    }
}

fn status_tally(report: &[ExpirationEntry], color: bool) -> String {
    [
        ExpirationStatus::Expired,
        ExpirationStatus::Critical,
        ExpirationStatus::Warning,
        ExpirationStatus::Expiring,
    ]
    .into_iter()
    .map(|status| {
        let count = report.iter().filter(|e| e.status == status).count();
        format!("{} {count}", output::expiration_label(status, color))
    })
    .collect::<Vec<_>>()
    .join("  ")
}
