// ── XML-RPC repositories ──
//
// One adapter over the shared `AsClient` implements all five repository
// traits. Users and groups live in the same profile store and are told
// apart by their kind marker.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use asadm_api::{AsClient, Profile, PropertyBag};

use super::{
    ConfigRepository, DisconnectRepository, GroupRepository, UserRepository, VpnStatusRepository,
};
use crate::codec::{self, ProfileKind, kind_of};
use crate::error::{CoreError, EntityKind};
use crate::model::{ConnectedUser, Group, NetworkConfig, ServerInfo, User};

/// Repository backed by the appliance's XML-RPC interface.
#[derive(Clone)]
pub struct RpcRepository {
    client: Arc<AsClient>,
}

impl RpcRepository {
    pub fn new(client: Arc<AsClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<AsClient> {
        &self.client
    }

    /// Fetch one profile of the expected kind.
    ///
    /// A fault, an absent profile and a kind mismatch all mean `NotFound`.
    async fn profile(&self, name: &str, expected: ProfileKind) -> Result<Profile, CoreError> {
        let entity = entity_kind(expected);
        let profile = match self.client.get_profile(name).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return Err(CoreError::not_found(entity, name)),
            Err(e) if e.is_fault() => {
                debug!(name, error = %e, "single-profile fetch faulted");
                return Err(CoreError::not_found(entity, name));
            }
            Err(e) => return Err(CoreError::remote("UserPropMultiGet", name, e)),
        };
        if kind_of(&profile.props) == Some(expected) {
            Ok(profile)
        } else {
            debug!(name, ?expected, "profile exists with a different kind");
            Err(CoreError::not_found(entity, name))
        }
    }

    /// Raw stored properties of `name`, if the appliance still has them.
    async fn stored_props(&self, name: &str) -> Result<Option<PropertyBag>, CoreError> {
        match self.client.get_profile(name).await {
            Ok(profile) => Ok(profile.map(|p| p.props)),
            Err(e) if e.is_fault() => Ok(None),
            Err(e) => Err(CoreError::remote("UserPropMultiGet", name, e)),
        }
    }

    async fn all_profiles(&self, kind: ProfileKind) -> Result<Vec<Profile>, CoreError> {
        let profiles = self
            .client
            .multi_get(None)
            .await
            .map_err(|e| CoreError::remote("UserPropMultiGet", "*", e))?;
        Ok(profiles
            .into_iter()
            .filter(|p| kind_of(&p.props) == Some(kind))
            .collect())
    }

    async fn put(&self, name: &str, props: &PropertyBag) -> Result<(), CoreError> {
        self.client
            .prop_put(name, props)
            .await
            .map_err(|e| CoreError::remote("UserPropPut", name, e))
    }

    async fn del(&self, name: &str, keys: &[String]) -> Result<(), CoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        self.client
            .prop_del(name, keys)
            .await
            .map_err(|e| CoreError::remote("UserPropDel", name, e))
    }

    async fn remove(&self, name: &str) -> Result<(), CoreError> {
        self.client
            .prop_delete(name)
            .await
            .map_err(|e| CoreError::remote("UserPropDelete", name, e))
    }
}

fn entity_kind(kind: ProfileKind) -> EntityKind {
    match kind {
        ProfileKind::User => EntityKind::User,
        ProfileKind::Group => EntityKind::Group,
    }
}

// ── Users ───────────────────────────────────────────────────────────

#[async_trait]
impl UserRepository for RpcRepository {
    async fn create(&self, user: &User) -> Result<(), CoreError> {
        self.put(&user.username, &codec::user::encode_create(user))
            .await?;
        info!(username = %user.username, "user created");
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<User, CoreError> {
        let profile = self.profile(username, ProfileKind::User).await?;
        Ok(codec::user::decode(&profile.name, &profile.props))
    }

    async fn list(&self) -> Result<Vec<User>, CoreError> {
        let profiles = self.all_profiles(ProfileKind::User).await?;
        Ok(profiles
            .iter()
            .map(|p| codec::user::decode(&p.name, &p.props))
            .collect())
    }

    async fn delete_stale_properties(&self, existing: &User) -> Result<(), CoreError> {
        let stored = self.stored_props(&existing.username).await?;
        let stale = codec::user::stale_properties(existing, stored.as_ref());
        debug!(username = %existing.username, count = stale.len(), "deleting stale user properties");
        self.del(&existing.username, &stale).await
    }

    async fn write_properties(&self, user: &User) -> Result<(), CoreError> {
        self.put(&user.username, &codec::user::encode_update(user))
            .await
    }

    async fn delete(&self, username: &str) -> Result<(), CoreError> {
        self.remove(username).await?;
        info!(username, "user deleted");
        Ok(())
    }

    async fn set_deny(&self, username: &str, deny: bool) -> Result<(), CoreError> {
        self.put(username, &codec::user::encode_deny(deny)).await?;
        info!(username, deny, "user access flag set");
        Ok(())
    }

    async fn set_password(&self, username: &str, password: &str) -> Result<(), CoreError> {
        self.client
            .set_local_password(username, password)
            .await
            .map_err(|e| CoreError::remote("SetLocalPassword", username, e))?;
        info!(username, "local password set");
        Ok(())
    }

    async fn regenerate_totp(&self, username: &str) -> Result<(), CoreError> {
        self.client
            .regenerate_totp(username)
            .await
            .map_err(|e| CoreError::remote("GoogleAuthenticatorRegenerate", username, e))?;
        info!(username, "TOTP secret regenerated");
        Ok(())
    }
}

// ── Groups ──────────────────────────────────────────────────────────

#[async_trait]
impl GroupRepository for RpcRepository {
    async fn create(&self, group: &Group) -> Result<(), CoreError> {
        self.put(&group.group_name, &codec::group::encode_create(group))
            .await?;
        info!(group = %group.group_name, "group created");
        Ok(())
    }

    async fn get(&self, group_name: &str) -> Result<Group, CoreError> {
        let profile = self.profile(group_name, ProfileKind::Group).await?;
        Ok(codec::group::decode(&profile.name, &profile.props))
    }

    async fn list(&self) -> Result<Vec<Group>, CoreError> {
        let profiles = self.all_profiles(ProfileKind::Group).await?;
        Ok(profiles
            .iter()
            .map(|p| codec::group::decode(&p.name, &p.props))
            .collect())
    }

    async fn delete_stale_properties(&self, existing: &Group) -> Result<(), CoreError> {
        let stored = self.stored_props(&existing.group_name).await?;
        let stale = codec::group::stale_properties(existing, stored.as_ref());
        debug!(group = %existing.group_name, count = stale.len(), "deleting stale group properties");
        self.del(&existing.group_name, &stale).await
    }

    async fn write_properties(&self, group: &Group) -> Result<(), CoreError> {
        self.put(&group.group_name, &codec::group::encode_update(group))
            .await
    }

    async fn delete(&self, group_name: &str) -> Result<(), CoreError> {
        self.remove(group_name).await?;
        info!(group = group_name, "group deleted");
        Ok(())
    }

    async fn set_deny(&self, group_name: &str, deny: bool) -> Result<(), CoreError> {
        self.put(group_name, &codec::user::encode_deny(deny)).await?;
        info!(group = group_name, deny, "group access flag set");
        Ok(())
    }

    async fn clear_access_control(&self, existing: &Group) -> Result<(), CoreError> {
        let stored = self.stored_props(&existing.group_name).await?;
        let keys = codec::group::access_properties(existing, stored.as_ref());
        self.del(&existing.group_name, &keys).await?;
        info!(group = %existing.group_name, removed = keys.len(), "group access control cleared");
        Ok(())
    }
}

// ── Configuration, status, disconnect ───────────────────────────────

#[async_trait]
impl ConfigRepository for RpcRepository {
    async fn server_info(&self) -> Result<ServerInfo, CoreError> {
        let dump = self
            .client
            .config_defaults()
            .await
            .map_err(|e| CoreError::remote("ConfigDefaults", "server", e))?;
        Ok(codec::server::decode_server_info(&dump))
    }

    async fn network_config(&self) -> Result<NetworkConfig, CoreError> {
        let dump = self
            .client
            .config_defaults()
            .await
            .map_err(|e| CoreError::remote("ConfigDefaults", "network", e))?;
        Ok(codec::server::decode_network_config(&dump))
    }
}

#[async_trait]
impl VpnStatusRepository for RpcRepository {
    async fn connected_users(&self) -> Result<Vec<ConnectedUser>, CoreError> {
        let daemons = self
            .client
            .vpn_status()
            .await
            .map_err(|e| CoreError::remote("GetVPNStatus", "status", e))?;
        Ok(codec::status::decode_connected_users(&daemons, Utc::now()))
    }
}

#[async_trait]
impl DisconnectRepository for RpcRepository {
    async fn disconnect(&self, usernames: &[String], message: Option<&str>) -> Result<(), CoreError> {
        self.client
            .disconnect_users(usernames, message)
            .await
            .map_err(|e| CoreError::remote("DisconnectUsers", usernames.join(","), e))?;
        info!(count = usernames.len(), "users disconnected");
        Ok(())
    }

    async fn restart(&self) -> Result<(), CoreError> {
        self.client
            .run_start()
            .await
            .map_err(|e| CoreError::remote("RunStart", "server", e))?;
        info!("warm restart requested");
        Ok(())
    }
}
