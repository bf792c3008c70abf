// ── User service ──
//
// Business rules layered over the user and group repositories: duplicate
// checks, group membership, directory checks for LDAP users, input
// normalization, address assignment, and the protected built-in admin.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::directory::DirectoryCheck;
use crate::error::{CoreError, EntityKind, ValidationError};
use crate::model::{
    AuthMethod, DEFAULT_GROUP, Group, IpAssignMode, NewUser, Page, User, UserFilter, UserUpdate,
};
use crate::network::{next_dynamic_ip, used_addresses, validate_static_ip};
use crate::query::{ExpirationEntry, ExpirationStatus, MAX_REPORT_DAYS, expiration_report};
use crate::repository::{GroupRepository, UserRepository};
use crate::validate::{check_password, fix_access_control, normalize_expiration, normalize_macs};

/// Name of the account that can be neither deleted nor disabled while it
/// holds the `Admin` role.
pub const BUILTIN_ADMIN: &str = "admin";

pub struct UserService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    directory: Arc<dyn DirectoryCheck>,
    /// Held from the uniqueness checks and address choice until the write
    /// that depends on them has landed.
    allocation: Mutex<()>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        directory: Arc<dyn DirectoryCheck>,
    ) -> Self {
        Self {
            users,
            groups,
            directory,
            allocation: Mutex::new(()),
        }
    }

    // ── Create ───────────────────────────────────────────────────────

    /// Create a user and, for local accounts, set its password.
    ///
    /// A password failure deletes the freshly created user again.
    pub async fn create(&self, input: NewUser) -> Result<User, CoreError> {
        let username = input.username.trim().to_owned();
        if username.is_empty() {
            return Err(ValidationError::Field {
                field: "username",
                message: "must not be empty".into(),
            }
            .into());
        }
        let allocation = self.allocation.lock().await;
        if self.users.exists(&username).await? {
            return Err(CoreError::already_exists(EntityKind::User, username));
        }

        let group_name = match input.group_name.trim() {
            "" => DEFAULT_GROUP.to_owned(),
            name => name.to_owned(),
        };
        let group = self.resolve_group(&group_name).await?;

        let email = input.email.trim().to_owned();
        if self.users.exists_by_email(&email).await? {
            return Err(ValidationError::Field {
                field: "email",
                message: format!("{email} is already used by another user"),
            }
            .into());
        }

        if input.auth_method == AuthMethod::Ldap {
            self.directory.check_user_exists(&username).await?;
        }

        let password = input.password.filter(|p| !p.is_empty());
        if input.auth_method == AuthMethod::Local {
            if let Some(ref pw) = password {
                check_password(pw)?;
            }
        }

        let mut user = User::new(&username, email, input.auth_method);
        user.group_name = group_name;
        user.user_expiration = normalize_expiration(&input.user_expiration)?;
        user.mac_addresses = normalize_macs(&input.mac_addresses)?;
        user.access_control = fix_access_control(&input.access_control)?;
        user.ip_assign_mode = input.ip_assign_mode.unwrap_or_default();
        user.ip_address = self
            .resolve_address(&user, group.as_ref(), Some(input.ip_address.as_str()))
            .await?;

        self.users.create(&user).await?;
        drop(allocation);

        if user.auth_method == AuthMethod::Local {
            if let Some(pw) = password {
                if let Err(e) = self.users.set_password(&username, &pw).await {
                    warn!(username, error = %e, "password could not be set, removing new user");
                    if let Err(cleanup) = self.users.delete(&username).await {
                        warn!(username, error = %cleanup, "cleanup after failed create did not succeed");
                    }
                    return Err(e);
                }
            }
        }

        info!(username, group = %user.group_name, ip = %user.ip_address, "user provisioned");
        Ok(user)
    }

    // ── Read ─────────────────────────────────────────────────────────

    /// Fetch one user. Members of a custom group without their own access
    /// entries show the group's.
    pub async fn get(&self, username: &str) -> Result<User, CoreError> {
        let mut user = self.users.get(username).await?;
        if user.auth_method == AuthMethod::Ldap {
            if let Err(e) = self.directory.check_user_exists(username).await {
                warn!(username, error = %e, "LDAP user missing from directory");
            }
        }
        if is_custom_group(&user.group_name) && user.access_control.is_empty() {
            match self.groups.get(&user.group_name).await {
                Ok(group) => user.access_control = group.access_control,
                Err(e) => warn!(username, group = %user.group_name, error = %e, "group lookup failed"),
            }
        }
        Ok(user)
    }

    /// Filtered page of users, with group access control filled in.
    pub async fn list(&self, filter: &UserFilter) -> Result<Page<User>, CoreError> {
        let mut page = self.users.query(filter).await?;
        if page
            .items
            .iter()
            .any(|u| is_custom_group(&u.group_name) && u.access_control.is_empty())
        {
            let acl = self.group_access_map().await?;
            for user in &mut page.items {
                if user.access_control.is_empty() {
                    if let Some(entries) = acl.get(&user.group_name) {
                        user.access_control.clone_from(entries);
                    }
                }
            }
        }
        Ok(page)
    }

    pub async fn exists(&self, username: &str) -> Result<bool, CoreError> {
        self.users.exists(username).await
    }

    // ── Update ───────────────────────────────────────────────────────

    /// Apply the supplied fields; everything else is kept.
    ///
    /// Runs the delete phase then the rewrite phase. A failure in either
    /// phase is answered with a restore of the previous state.
    pub async fn update(&self, username: &str, update: UserUpdate) -> Result<User, CoreError> {
        let _allocation = self.allocation.lock().await;
        let existing = self.users.get(username).await?;
        if existing.auth_method == AuthMethod::Ldap {
            self.directory.check_user_exists(username).await?;
        }

        let mut merged = existing.clone();
        if let Some(ref exp) = update.user_expiration {
            merged.user_expiration = normalize_expiration(exp)?;
        }
        if let Some(deny) = update.deny_access {
            merged.deny_access = deny;
        }
        if let Some(ref macs) = update.mac_addresses {
            merged.mac_addresses = normalize_macs(macs)?;
        }
        if let Some(ref acl) = update.access_control {
            merged.access_control = fix_access_control(acl)?;
        }
        if let Some(ref group) = update.group_name {
            merged.group_name = match group.trim() {
                "" => DEFAULT_GROUP.to_owned(),
                name => name.to_owned(),
            };
        }

        // A bare address implies static assignment. Moving to another group
        // re-runs the current mode against the new group.
        let group_changed = merged.group_name != existing.group_name;
        let mode = update
            .ip_assign_mode
            .or_else(|| update.ip_address.as_ref().map(|_| IpAssignMode::Static))
            .or_else(|| group_changed.then_some(merged.ip_assign_mode));

        let group = if update.group_name.is_some() || mode.is_some() {
            self.resolve_group(&merged.group_name).await?
        } else {
            None
        };

        if let Some(mode) = mode {
            merged.ip_assign_mode = mode;
            let requested = update.ip_address.as_deref().unwrap_or(&existing.ip_address);
            merged.ip_address = self
                .resolve_address(&merged, group.as_ref(), Some(requested))
                .await?;
        }

        self.users.update(&existing, &merged).await?;
        Ok(merged)
    }

    pub async fn enable(&self, username: &str) -> Result<(), CoreError> {
        self.users.get(username).await?;
        self.users.enable(username).await
    }

    pub async fn disable(&self, username: &str) -> Result<(), CoreError> {
        let user = self.users.get(username).await?;
        guard_builtin_admin(&user, "disable")?;
        self.users.disable(username).await
    }

    pub async fn delete(&self, username: &str) -> Result<(), CoreError> {
        let user = self.users.get(username).await?;
        guard_builtin_admin(&user, "delete")?;
        self.users.delete(username).await
    }

    // ── Credentials ──────────────────────────────────────────────────

    /// Local accounts only.
    pub async fn change_password(&self, username: &str, password: &str) -> Result<(), CoreError> {
        let user = self.users.get(username).await?;
        if user.auth_method != AuthMethod::Local {
            return Err(CoreError::rejected(format!(
                "{username} authenticates via {}; only local users have a password here",
                user.auth_method
            )));
        }
        check_password(password)?;
        self.users.set_password(username, password).await
    }

    pub async fn regenerate_totp(&self, username: &str) -> Result<(), CoreError> {
        if !self.users.exists(username).await? {
            return Err(CoreError::not_found(EntityKind::User, username));
        }
        self.users.regenerate_totp(username).await
    }

    // ── Expiration ───────────────────────────────────────────────────

    pub async fn expirations(&self, days: i64) -> Result<Vec<ExpirationEntry>, CoreError> {
        self.expirations_on(days, Utc::now().date_naive()).await
    }

    /// Expiration report relative to `today`. `days` must lie in `0..=365`.
    pub async fn expirations_on(
        &self,
        days: i64,
        today: NaiveDate,
    ) -> Result<Vec<ExpirationEntry>, CoreError> {
        if !(0..=MAX_REPORT_DAYS).contains(&days) {
            return Err(ValidationError::Field {
                field: "days",
                message: format!("must be between 0 and {MAX_REPORT_DAYS}"),
            }
            .into());
        }
        let users = self.users.list().await?;
        let mut report = expiration_report(&users, days, today);
        if report
            .iter()
            .any(|e| is_custom_group(&e.group_name) && e.access_control.is_empty())
        {
            let acl = self.group_access_map().await?;
            for entry in &mut report {
                if entry.access_control.is_empty() {
                    if let Some(entries) = acl.get(&entry.group_name) {
                        entry.access_control.clone_from(entries);
                    }
                }
            }
        }
        debug!(days, count = report.len(), "expiration report built");
        Ok(report)
    }

    /// Emails of users expiring within `days` that have not expired yet.
    pub async fn expiring_emails(&self, days: i64) -> Result<Vec<String>, CoreError> {
        let report = self.expirations(days).await?;
        Ok(emails_of(&report))
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// `None` for the default group; the group itself otherwise.
    async fn resolve_group(&self, group_name: &str) -> Result<Option<Group>, CoreError> {
        if !is_custom_group(group_name) {
            return Ok(None);
        }
        self.groups.get(group_name).await.map(Some)
    }

    /// Pick or check the address for `user` under its assignment mode.
    ///
    /// Dynamic assignment in a group without subnets leaves the address
    /// empty so the appliance draws from its own pool.
    async fn resolve_address(
        &self,
        user: &User,
        group: Option<&Group>,
        requested: Option<&str>,
    ) -> Result<String, CoreError> {
        match user.ip_assign_mode {
            IpAssignMode::Dynamic => {
                let Some(group) = group.filter(|g| !g.group_subnet.is_empty()) else {
                    return Ok(String::new());
                };
                let others: Vec<User> = self
                    .users
                    .list()
                    .await?
                    .into_iter()
                    .filter(|u| u.username != user.username)
                    .collect();
                let ip = next_dynamic_ip(group, &used_addresses(&others))?;
                Ok(ip.to_string())
            }
            IpAssignMode::Static => {
                let raw = requested.unwrap_or_default();
                let Some(group) = group else {
                    return Err(ValidationError::IpOutsideGroup {
                        ip: raw.to_owned(),
                        group: user.group_name.clone(),
                    }
                    .into());
                };
                let users = self.users.list().await?;
                let ip = validate_static_ip(raw, group, &users, &user.username)?;
                Ok(ip.to_string())
            }
        }
    }

    async fn group_access_map(&self) -> Result<HashMap<String, Vec<String>>, CoreError> {
        Ok(self
            .groups
            .list()
            .await?
            .into_iter()
            .map(|g| (g.group_name, g.access_control))
            .collect())
    }
}

fn is_custom_group(name: &str) -> bool {
    !name.is_empty() && name != DEFAULT_GROUP
}

fn guard_builtin_admin(user: &User, action: &str) -> Result<(), CoreError> {
    if user.username.eq_ignore_ascii_case(BUILTIN_ADMIN) && user.is_admin() {
        return Err(CoreError::rejected(format!(
            "cannot {action} the built-in admin account"
        )));
    }
    Ok(())
}

fn emails_of(report: &[ExpirationEntry]) -> Vec<String> {
    report
        .iter()
        .filter(|e| e.status != ExpirationStatus::Expired && !e.email.is_empty())
        .map(|e| e.email.clone())
        .collect()
}
