// ── Group service ──

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CoreError, EntityKind, ValidationError};
use crate::model::{DEFAULT_GROUP, Group, GroupFilter, GroupUpdate, Page};
use crate::network::validate_group_addressing;
use crate::repository::{ConfigRepository, GroupRepository};
use crate::validate::fix_access_control;

pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
    config: Arc<dyn ConfigRepository>,
    /// Held across the sibling-subnet scan and the write it approved.
    allocation: Mutex<()>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupRepository>, config: Arc<dyn ConfigRepository>) -> Self {
        Self {
            groups,
            config,
            allocation: Mutex::new(()),
        }
    }

    /// Create a group after checking its addressing against the appliance
    /// networks and every other group. Nothing is written on failure.
    pub async fn create(&self, mut group: Group) -> Result<Group, CoreError> {
        group.group_name = group.group_name.trim().to_owned();
        if group.group_name.is_empty() {
            return Err(ValidationError::Field {
                field: "groupName",
                message: "must not be empty".into(),
            }
            .into());
        }
        let _allocation = self.allocation.lock().await;
        if self.groups.exists(&group.group_name).await? {
            return Err(CoreError::already_exists(
                EntityKind::Group,
                group.group_name,
            ));
        }

        group.access_control = fix_access_control(&group.access_control)?;
        self.check_addressing(&group, None).await?;

        self.groups.create(&group).await?;
        Ok(group)
    }

    pub async fn get(&self, group_name: &str) -> Result<Group, CoreError> {
        self.groups.get(group_name).await
    }

    pub async fn list(&self, filter: &GroupFilter) -> Result<Page<Group>, CoreError> {
        self.groups.query(filter).await
    }

    /// Apply the supplied fields and rewrite the group.
    ///
    /// Addressing is re-validated only when subnets or ranges change, with
    /// the group itself left out of the sibling scan.
    pub async fn update(&self, group_name: &str, update: GroupUpdate) -> Result<Group, CoreError> {
        let _allocation = self.allocation.lock().await;
        let existing = self.groups.get(group_name).await?;
        let mut merged = update.apply(&existing);

        if update.access_control.is_some() {
            merged.access_control = fix_access_control(&merged.access_control)?;
        }
        if update.group_subnet.is_some() || update.group_range.is_some() {
            self.check_addressing(&merged, Some(group_name)).await?;
        }

        self.groups.update(&existing, &merged).await?;
        Ok(merged)
    }

    pub async fn delete(&self, group_name: &str) -> Result<(), CoreError> {
        if group_name == DEFAULT_GROUP {
            return Err(CoreError::rejected("cannot delete the default group"));
        }
        self.groups.get(group_name).await?;
        self.groups.delete(group_name).await
    }

    pub async fn enable(&self, group_name: &str) -> Result<(), CoreError> {
        self.groups.get(group_name).await?;
        self.groups.enable(group_name).await
    }

    pub async fn disable(&self, group_name: &str) -> Result<(), CoreError> {
        self.groups.get(group_name).await?;
        self.groups.disable(group_name).await
    }

    pub async fn clear_access_control(&self, group_name: &str) -> Result<(), CoreError> {
        let existing = self.groups.get(group_name).await?;
        if existing.access_control.is_empty() {
            debug!(group = group_name, "no access entries to clear");
            return Ok(());
        }
        self.groups.clear_access_control(&existing).await
    }

    async fn check_addressing(&self, group: &Group, self_name: Option<&str>) -> Result<(), CoreError> {
        if group.group_subnet.is_empty() && group.group_range.is_empty() {
            return Ok(());
        }
        if group.group_subnet.is_empty() {
            return Err(ValidationError::RangeWithoutSubnet.into());
        }
        let network = self.config.network_config().await?;
        let siblings = self.groups.list().await?;
        validate_group_addressing(
            &group.group_subnet,
            &group.group_range,
            &network,
            &siblings,
            self_name,
        )
    }
}
