// ── Repository interfaces ──
//
// The only surface services and front ends use to reach the appliance.
// Listing, existence checks and the two-phase update are provided here on
// top of a handful of primitive operations, so every implementation gets
// the same client-side filtering and the same restore-on-failure behavior.

pub mod rpc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::{CoreError, EntityKind, RestoreOutcome};
use crate::model::{
    ConnectedUser, Group, GroupFilter, NetworkConfig, Page, ServerInfo, User, UserFilter,
    VpnStatusSummary,
};
use crate::query::{query_groups, query_users};

pub use rpc::RpcRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), CoreError>;

    /// Fails with `NotFound` when the name is absent or belongs to a group.
    async fn get(&self, username: &str) -> Result<User, CoreError>;

    /// Every user, unfiltered, in appliance order.
    async fn list(&self) -> Result<Vec<User>, CoreError>;

    /// First update phase: drop the indexed properties `existing` occupies.
    async fn delete_stale_properties(&self, existing: &User) -> Result<(), CoreError>;

    /// Second update phase, also used to restore `existing` after a failed
    /// first phase.
    async fn write_properties(&self, user: &User) -> Result<(), CoreError>;

    async fn delete(&self, username: &str) -> Result<(), CoreError>;

    async fn set_deny(&self, username: &str, deny: bool) -> Result<(), CoreError>;

    async fn set_password(&self, username: &str, password: &str) -> Result<(), CoreError>;

    async fn regenerate_totp(&self, username: &str) -> Result<(), CoreError>;

    async fn query(&self, filter: &UserFilter) -> Result<Page<User>, CoreError> {
        let users = self.list().await?;
        Ok(query_users(users, filter, Utc::now().date_naive()))
    }

    async fn exists(&self, username: &str) -> Result<bool, CoreError> {
        match self.get(username).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, CoreError> {
        if email.trim().is_empty() {
            return Ok(false);
        }
        let users = self.list().await?;
        Ok(users.iter().any(|u| u.email.eq_ignore_ascii_case(email)))
    }

    /// Delete-then-rewrite. When either phase fails, `existing` is written
    /// back and both outcomes are reported.
    async fn update(&self, existing: &User, updated: &User) -> Result<(), CoreError> {
        if let Err(cause) = self.delete_stale_properties(existing).await {
            error!(username = %existing.username, error = %cause, "stale property delete failed, restoring");
            return Err(restore_failure(
                EntityKind::User,
                &existing.username,
                cause,
                self.write_properties(existing).await,
            ));
        }
        if let Err(cause) = self.write_properties(updated).await {
            error!(username = %existing.username, error = %cause, "property rewrite failed, restoring");
            return Err(restore_failure(
                EntityKind::User,
                &existing.username,
                cause,
                self.write_properties(existing).await,
            ));
        }
        info!(username = %updated.username, "user updated");
        Ok(())
    }

    async fn enable(&self, username: &str) -> Result<(), CoreError> {
        self.set_deny(username, false).await
    }

    async fn disable(&self, username: &str) -> Result<(), CoreError> {
        self.set_deny(username, true).await
    }
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn create(&self, group: &Group) -> Result<(), CoreError>;

    /// Fails with `NotFound` when the name is absent or belongs to a user.
    async fn get(&self, group_name: &str) -> Result<Group, CoreError>;

    async fn list(&self) -> Result<Vec<Group>, CoreError>;

    async fn delete_stale_properties(&self, existing: &Group) -> Result<(), CoreError>;

    async fn write_properties(&self, group: &Group) -> Result<(), CoreError>;

    async fn delete(&self, group_name: &str) -> Result<(), CoreError>;

    async fn set_deny(&self, group_name: &str, deny: bool) -> Result<(), CoreError>;

    /// Remove every access entry of `existing`.
    async fn clear_access_control(&self, existing: &Group) -> Result<(), CoreError>;

    async fn query(&self, filter: &GroupFilter) -> Result<Page<Group>, CoreError> {
        let groups = self.list().await?;
        Ok(query_groups(groups, filter))
    }

    async fn exists(&self, group_name: &str) -> Result<bool, CoreError> {
        match self.get(group_name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete-then-rewrite with restore, as for users.
    async fn update(&self, existing: &Group, updated: &Group) -> Result<(), CoreError> {
        if let Err(cause) = self.delete_stale_properties(existing).await {
            error!(group = %existing.group_name, error = %cause, "stale property delete failed, restoring");
            return Err(restore_failure(
                EntityKind::Group,
                &existing.group_name,
                cause,
                self.write_properties(existing).await,
            ));
        }
        if let Err(cause) = self.write_properties(updated).await {
            error!(group = %existing.group_name, error = %cause, "property rewrite failed, restoring");
            return Err(restore_failure(
                EntityKind::Group,
                &existing.group_name,
                cause,
                self.write_properties(existing).await,
            ));
        }
        info!(group = %updated.group_name, "group updated");
        Ok(())
    }

    async fn enable(&self, group_name: &str) -> Result<(), CoreError> {
        self.set_deny(group_name, false).await
    }

    async fn disable(&self, group_name: &str) -> Result<(), CoreError> {
        self.set_deny(group_name, true).await
    }
}

/// Read-only appliance configuration.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn server_info(&self) -> Result<ServerInfo, CoreError>;
    async fn network_config(&self) -> Result<NetworkConfig, CoreError>;
}

#[async_trait]
pub trait VpnStatusRepository: Send + Sync {
    async fn connected_users(&self) -> Result<Vec<ConnectedUser>, CoreError>;

    /// Username match ignores case.
    async fn is_user_connected(&self, username: &str) -> Result<bool, CoreError> {
        let users = self.connected_users().await?;
        Ok(users.iter().any(|u| u.username.eq_ignore_ascii_case(username)))
    }

    async fn summary(&self) -> Result<VpnStatusSummary, CoreError> {
        let connected_users = self.connected_users().await?;
        Ok(VpnStatusSummary {
            total_connected_users: connected_users.len(),
            connected_users,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
pub trait DisconnectRepository: Send + Sync {
    /// `message` falls back to the appliance default when `None` or empty.
    async fn disconnect(&self, usernames: &[String], message: Option<&str>) -> Result<(), CoreError>;

    /// Warm restart of the VPN services.
    async fn restart(&self) -> Result<(), CoreError>;
}

fn restore_failure(
    entity: EntityKind,
    identifier: &str,
    cause: CoreError,
    restore: Result<(), CoreError>,
) -> CoreError {
    let restore = match restore {
        Ok(()) => RestoreOutcome::Restored,
        Err(e) => {
            warn!(%entity, identifier, error = %e, "restore after failed update did not succeed");
            RestoreOutcome::Failed(e.to_string())
        }
    };
    CoreError::PartialUpdate {
        entity,
        identifier: identifier.to_owned(),
        cause: Box::new(cause),
        restore,
    }
}
