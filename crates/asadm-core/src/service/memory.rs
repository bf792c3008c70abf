// In-memory repositories for service tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::{CoreError, EntityKind};
use crate::model::{ConnectedUser, Group, NetworkConfig, ServerInfo, User};
use crate::repository::{
    ConfigRepository, DisconnectRepository, GroupRepository, UserRepository, VpnStatusRepository,
};

fn rejected(op: &str) -> CoreError {
    CoreError::rejected(format!("{op} refused by test appliance"))
}

#[derive(Default)]
pub(crate) struct MemoryUsers {
    pub users: Mutex<IndexMap<String, User>>,
    pub passwords: Mutex<IndexMap<String, String>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_stale_delete: AtomicBool,
    pub fail_write: AtomicBool,
    /// Fails only the next write.
    pub fail_next_write: AtomicBool,
    pub fail_password: AtomicBool,
}

impl MemoryUsers {
    pub fn with(users: impl IntoIterator<Item = User>) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.users.lock().unwrap();
            for u in users {
                map.insert(u.username.clone(), u);
            }
        }
        repo
    }

    pub fn stored(&self, username: &str) -> Option<User> {
        self.users.lock().unwrap().get(username).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create(&self, user: &User) -> Result<(), CoreError> {
        self.record(format!("create {}", user.username));
        let mut stored = user.clone();
        stored.password = None;
        self.users.lock().unwrap().insert(user.username.clone(), stored);
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<User, CoreError> {
        self.stored(username)
            .ok_or_else(|| CoreError::not_found(EntityKind::User, username))
    }

    async fn list(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.users.lock().unwrap().values().cloned().collect())
    }

    async fn delete_stale_properties(&self, existing: &User) -> Result<(), CoreError> {
        self.record(format!("delete_stale {}", existing.username));
        if self.fail_stale_delete.load(Ordering::SeqCst) {
            return Err(rejected("UserPropDel"));
        }
        if let Some(u) = self.users.lock().unwrap().get_mut(&existing.username) {
            u.mac_addresses.clear();
            u.access_control.clear();
            u.ip_address.clear();
        }
        Ok(())
    }

    async fn write_properties(&self, user: &User) -> Result<(), CoreError> {
        self.record(format!("write {}", user.username));
        if self.fail_write.load(Ordering::SeqCst) || self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(rejected("UserPropPut"));
        }
        self.users.lock().unwrap().insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn delete(&self, username: &str) -> Result<(), CoreError> {
        self.record(format!("delete {username}"));
        self.users.lock().unwrap().shift_remove(username);
        Ok(())
    }

    async fn set_deny(&self, username: &str, deny: bool) -> Result<(), CoreError> {
        self.record(format!("deny {username} {deny}"));
        match self.users.lock().unwrap().get_mut(username) {
            Some(u) => {
                u.deny_access = deny;
                Ok(())
            }
            None => Err(CoreError::not_found(EntityKind::User, username)),
        }
    }

    async fn set_password(&self, username: &str, password: &str) -> Result<(), CoreError> {
        self.record(format!("password {username}"));
        if self.fail_password.load(Ordering::SeqCst) {
            return Err(rejected("SetLocalPassword"));
        }
        self.passwords
            .lock()
            .unwrap()
            .insert(username.to_owned(), password.to_owned());
        Ok(())
    }

    async fn regenerate_totp(&self, username: &str) -> Result<(), CoreError> {
        self.record(format!("totp {username}"));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryGroups {
    pub groups: Mutex<IndexMap<String, Group>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_stale_delete: AtomicBool,
}

impl MemoryGroups {
    pub fn with(groups: impl IntoIterator<Item = Group>) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.groups.lock().unwrap();
            for g in groups {
                map.insert(g.group_name.clone(), g);
            }
        }
        repo
    }

    pub fn stored(&self, name: &str) -> Option<Group> {
        self.groups.lock().unwrap().get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl GroupRepository for MemoryGroups {
    async fn create(&self, group: &Group) -> Result<(), CoreError> {
        self.record(format!("create {}", group.group_name));
        self.groups
            .lock()
            .unwrap()
            .insert(group.group_name.clone(), group.clone());
        Ok(())
    }

    async fn get(&self, group_name: &str) -> Result<Group, CoreError> {
        self.stored(group_name)
            .ok_or_else(|| CoreError::not_found(EntityKind::Group, group_name))
    }

    async fn list(&self) -> Result<Vec<Group>, CoreError> {
        Ok(self.groups.lock().unwrap().values().cloned().collect())
    }

    async fn delete_stale_properties(&self, existing: &Group) -> Result<(), CoreError> {
        self.record(format!("delete_stale {}", existing.group_name));
        if self.fail_stale_delete.load(Ordering::SeqCst) {
            return Err(rejected("UserPropDel"));
        }
        Ok(())
    }

    async fn write_properties(&self, group: &Group) -> Result<(), CoreError> {
        self.record(format!("write {}", group.group_name));
        self.groups
            .lock()
            .unwrap()
            .insert(group.group_name.clone(), group.clone());
        Ok(())
    }

    async fn delete(&self, group_name: &str) -> Result<(), CoreError> {
        self.record(format!("delete {group_name}"));
        self.groups.lock().unwrap().shift_remove(group_name);
        Ok(())
    }

    async fn set_deny(&self, group_name: &str, deny: bool) -> Result<(), CoreError> {
        self.record(format!("deny {group_name} {deny}"));
        if let Some(g) = self.groups.lock().unwrap().get_mut(group_name) {
            g.deny_access = deny;
        }
        Ok(())
    }

    async fn clear_access_control(&self, existing: &Group) -> Result<(), CoreError> {
        self.record(format!("clear_access {}", existing.group_name));
        if let Some(g) = self.groups.lock().unwrap().get_mut(&existing.group_name) {
            g.access_control.clear();
        }
        Ok(())
    }
}

/// Configuration, status and disconnect in one fake.
#[derive(Default)]
pub(crate) struct MemoryAppliance {
    pub network: NetworkConfig,
    pub sessions: Vec<ConnectedUser>,
    pub disconnected: Mutex<Vec<(Vec<String>, Option<String>)>>,
    pub restarts: Mutex<usize>,
}

impl MemoryAppliance {
    /// Client network 172.27.224.0/20, group pool 172.27.240.0/20.
    pub fn standard() -> Self {
        Self {
            network: NetworkConfig {
                client_network: "172.27.224.0".into(),
                client_netmask_bits: "20".into(),
                group_pool: "172.27.240.0/20".into(),
                ..NetworkConfig::default()
            },
            ..Self::default()
        }
    }
}

#[async_trait]
impl ConfigRepository for MemoryAppliance {
    async fn server_info(&self) -> Result<ServerInfo, CoreError> {
        Ok(ServerInfo {
            node_type: "PRIMARY".into(),
            ..ServerInfo::default()
        })
    }

    async fn network_config(&self) -> Result<NetworkConfig, CoreError> {
        Ok(self.network.clone())
    }
}

#[async_trait]
impl VpnStatusRepository for MemoryAppliance {
    async fn connected_users(&self) -> Result<Vec<ConnectedUser>, CoreError> {
        Ok(self.sessions.clone())
    }
}

#[async_trait]
impl DisconnectRepository for MemoryAppliance {
    async fn disconnect(&self, usernames: &[String], message: Option<&str>) -> Result<(), CoreError> {
        self.disconnected
            .lock()
            .unwrap()
            .push((usernames.to_vec(), message.map(str::to_owned)));
        Ok(())
    }

    async fn restart(&self) -> Result<(), CoreError> {
        *self.restarts.lock().unwrap() += 1;
        Ok(())
    }
}
