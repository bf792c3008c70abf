// ── Status service ──
//
// Live sessions, disconnects, restart and the read-only configuration
// views.

use std::sync::Arc;

use tracing::info;

use crate::error::{CoreError, ValidationError};
use crate::model::{ConnectedUser, NetworkConfig, ServerInfo, VpnStatusSummary};
use crate::repository::{ConfigRepository, DisconnectRepository, VpnStatusRepository};

pub struct StatusService {
    status: Arc<dyn VpnStatusRepository>,
    disconnect: Arc<dyn DisconnectRepository>,
    config: Arc<dyn ConfigRepository>,
}

impl StatusService {
    pub fn new(
        status: Arc<dyn VpnStatusRepository>,
        disconnect: Arc<dyn DisconnectRepository>,
        config: Arc<dyn ConfigRepository>,
    ) -> Self {
        Self {
            status,
            disconnect,
            config,
        }
    }

    pub async fn connected_users(&self) -> Result<Vec<ConnectedUser>, CoreError> {
        self.status.connected_users().await
    }

    pub async fn is_user_connected(&self, username: &str) -> Result<bool, CoreError> {
        self.status.is_user_connected(username).await
    }

    pub async fn summary(&self) -> Result<VpnStatusSummary, CoreError> {
        self.status.summary().await
    }

    pub async fn disconnect_user(&self, username: &str, message: Option<&str>) -> Result<(), CoreError> {
        self.disconnect_users(&[username.to_owned()], message).await
    }

    /// Blank names are dropped; an empty list is rejected.
    pub async fn disconnect_users(
        &self,
        usernames: &[String],
        message: Option<&str>,
    ) -> Result<(), CoreError> {
        let names: Vec<String> = usernames
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_owned)
            .collect();
        if names.is_empty() {
            return Err(ValidationError::Field {
                field: "usernames",
                message: "at least one username is required".into(),
            }
            .into());
        }
        self.disconnect.disconnect(&names, message).await
    }

    pub async fn restart(&self) -> Result<(), CoreError> {
        info!("restarting VPN services");
        self.disconnect.restart().await
    }

    pub async fn server_info(&self) -> Result<ServerInfo, CoreError> {
        self.config.server_info().await
    }

    pub async fn network_config(&self) -> Result<NetworkConfig, CoreError> {
        self.config.network_config().await
    }
}
