// ── Bulk operations ──
//
// Batches of user and group operations run with bounded concurrency.
// Progress lives in a single tracker map keyed by operation id, written by
// the runner and readable by anyone polling for status. Each entity kind
// keeps a bounded history of finished operations.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use futures_util::stream;
use serde::Serialize;
use strum::{Display, EnumString};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{Group, NewUser};
use crate::service::{GroupService, UserService};

/// Finished operations remembered per entity kind.
pub const HISTORY_LIMIT: usize = 50;

/// Items processed at once when no concurrency is given.
pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BulkKind {
    Users,
    Groups,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BulkAction {
    Create,
    Delete,
    Enable,
    Disable,
    ResetOtp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BulkStatus {
    Pending,
    Running,
    Completed,
    /// Finished with no successful item.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItemResult {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperation {
    pub id: Uuid,
    pub kind: BulkKind,
    pub action: BulkAction,
    pub status: BulkStatus,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BulkOperation {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }
}

// ── Tracker ─────────────────────────────────────────────────────────

#[derive(Default)]
struct TrackerState {
    operations: HashMap<Uuid, BulkOperation>,
    history: HashMap<BulkKind, VecDeque<Uuid>>,
}

/// Shared status and history of bulk operations.
#[derive(Default)]
pub struct BulkTracker {
    state: RwLock<TrackerState>,
}

impl BulkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending operation and return its id.
    pub async fn begin(&self, kind: BulkKind, action: BulkAction, total: usize) -> Uuid {
        let id = Uuid::new_v4();
        let op = BulkOperation {
            id,
            kind,
            action,
            status: BulkStatus::Pending,
            total,
            succeeded: 0,
            failed: 0,
            results: Vec::with_capacity(total),
            started_at: Utc::now(),
            finished_at: None,
        };
        self.state.write().await.operations.insert(id, op);
        id
    }

    pub async fn mark_running(&self, id: Uuid) {
        if let Some(op) = self.state.write().await.operations.get_mut(&id) {
            op.status = BulkStatus::Running;
        }
    }

    pub async fn record(&self, id: Uuid, result: BulkItemResult) {
        let mut state = self.state.write().await;
        let Some(op) = state.operations.get_mut(&id) else {
            return;
        };
        if result.success {
            op.succeeded += 1;
        } else {
            op.failed += 1;
        }
        op.results.push(result);
    }

    /// Close the operation and push it into its kind's history, evicting
    /// the oldest entries past [`HISTORY_LIMIT`].
    pub async fn finish(&self, id: Uuid) -> Option<BulkOperation> {
        let mut state = self.state.write().await;
        let op = state.operations.get_mut(&id)?;
        op.status = if op.total > 0 && op.succeeded == 0 {
            BulkStatus::Failed
        } else {
            BulkStatus::Completed
        };
        op.finished_at = Some(Utc::now());
        let finished = op.clone();

        let history = state.history.entry(finished.kind).or_default();
        history.push_back(id);
        let mut evicted = Vec::new();
        while history.len() > HISTORY_LIMIT {
            if let Some(old) = history.pop_front() {
                evicted.push(old);
            }
        }
        for old in evicted {
            state.operations.remove(&old);
        }
        Some(finished)
    }

    pub async fn get(&self, id: Uuid) -> Option<BulkOperation> {
        self.state.read().await.operations.get(&id).cloned()
    }

    /// Finished operations of `kind`, newest first.
    pub async fn history(&self, kind: BulkKind, limit: usize) -> Vec<BulkOperation> {
        let state = self.state.read().await;
        state
            .history
            .get(&kind)
            .map(|ids| {
                ids.iter()
                    .rev()
                    .filter_map(|id| state.operations.get(id).cloned())
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ── Runner ──────────────────────────────────────────────────────────

pub struct BulkRunner {
    users: Arc<UserService>,
    groups: Arc<GroupService>,
    tracker: Arc<BulkTracker>,
    concurrency: usize,
}

impl BulkRunner {
    pub fn new(users: Arc<UserService>, groups: Arc<GroupService>, tracker: Arc<BulkTracker>) -> Self {
        Self {
            users,
            groups,
            tracker,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn tracker(&self) -> &Arc<BulkTracker> {
        &self.tracker
    }

    /// Address choice and the write it feeds are serialized inside
    /// [`UserService`]; the rest of each create overlaps.
    pub async fn create_users(&self, inputs: Vec<NewUser>) -> BulkOperation {
        let users = &self.users;
        self.run(
            BulkKind::Users,
            BulkAction::Create,
            inputs,
            |u| u.username.clone(),
            |u| async move { users.create(u).await.map(|_| ()) },
        )
        .await
    }

    /// Apply `action` to every named user. `Create` is not a name action.
    pub async fn user_action(
        &self,
        action: BulkAction,
        usernames: Vec<String>,
    ) -> Result<BulkOperation, CoreError> {
        if action == BulkAction::Create {
            return Err(CoreError::rejected("use create_users for bulk creation"));
        }
        let users = &self.users;
        Ok(self
            .run(
                BulkKind::Users,
                action,
                usernames,
                String::clone,
                |name| async move {
                    match action {
                        BulkAction::Delete => users.delete(&name).await,
                        BulkAction::Enable => users.enable(&name).await,
                        BulkAction::Disable => users.disable(&name).await,
                        BulkAction::ResetOtp => users.regenerate_totp(&name).await,
                        BulkAction::Create => Ok(()),
                    }
                },
            )
            .await)
    }

    pub async fn create_groups(&self, groups: Vec<Group>) -> BulkOperation {
        let svc = &self.groups;
        self.run(
            BulkKind::Groups,
            BulkAction::Create,
            groups,
            |g| g.group_name.clone(),
            |g| async move { svc.create(g).await.map(|_| ()) },
        )
        .await
    }

    /// Delete, enable or disable every named group.
    pub async fn group_action(
        &self,
        action: BulkAction,
        names: Vec<String>,
    ) -> Result<BulkOperation, CoreError> {
        if !matches!(
            action,
            BulkAction::Delete | BulkAction::Enable | BulkAction::Disable
        ) {
            return Err(CoreError::rejected(format!(
                "{action} is not a group bulk action"
            )));
        }
        let svc = &self.groups;
        Ok(self
            .run(
                BulkKind::Groups,
                action,
                names,
                String::clone,
                |name| async move {
                    match action {
                        BulkAction::Delete => svc.delete(&name).await,
                        BulkAction::Disable => svc.disable(&name).await,
                        _ => svc.enable(&name).await,
                    }
                },
            )
            .await)
    }

    async fn run<T, N, F, Fut>(
        &self,
        kind: BulkKind,
        action: BulkAction,
        items: Vec<T>,
        name_of: N,
        op: F,
    ) -> BulkOperation
    where
        N: Fn(&T) -> String,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let id = self.tracker.begin(kind, action, items.len()).await;
        self.tracker.mark_running(id).await;
        info!(%id, %kind, %action, total = items.len(), "bulk operation started");

        let mut results = std::pin::pin!(
            stream::iter(items)
                .map(|item| {
                    let name = name_of(&item);
                    let fut = op(item);
                    async move { (name, fut.await) }
                })
                .buffer_unordered(self.concurrency)
        );

        while let Some((name, outcome)) = results.next().await {
            let result = match outcome {
                Ok(()) => {
                    debug!(%id, name, "bulk item succeeded");
                    BulkItemResult {
                        name,
                        success: true,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(%id, name, error = %e, "bulk item failed");
                    BulkItemResult {
                        name,
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            self.tracker.record(id, result).await;
        }

        match self.tracker.finish(id).await {
            Some(op) => {
                info!(%id, succeeded = op.succeeded, failed = op.failed, "bulk operation finished");
                op
            }
            // Entry vanished from the tracker before it finished.
            None => BulkOperation {
                id,
                kind,
                action,
                status: BulkStatus::Completed,
                total: 0,
                succeeded: 0,
                failed: 0,
                results: Vec::new(),
                started_at: Utc::now(),
                finished_at: Some(Utc::now()),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::directory::NoDirectory;
    use crate::model::{AuthMethod, User};
    use crate::service::memory::{MemoryAppliance, MemoryGroups, MemoryUsers};

    fn runner(users: Vec<User>) -> (BulkRunner, Arc<MemoryUsers>) {
        let u = Arc::new(MemoryUsers::with(users));
        let g = Arc::new(MemoryGroups::default());
        let user_svc = Arc::new(UserService::new(u.clone(), g.clone(), Arc::new(NoDirectory)));
        let group_svc = Arc::new(GroupService::new(g, Arc::new(MemoryAppliance::standard())));
        let runner = BulkRunner::new(user_svc, group_svc, Arc::new(BulkTracker::new()))
            .with_concurrency(2);
        (runner, u)
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            password: Some("long-enough-pw".into()),
            ..NewUser::default()
        }
    }

    #[tokio::test]
    async fn create_batch_reports_each_item() {
        let existing = User::new("taken", "taken@example.com", AuthMethod::Local);
        let (runner, repo) = runner(vec![existing]);

        let op = runner
            .create_users(vec![new_user("one"), new_user("taken"), new_user("two")])
            .await;
        assert_eq!(op.status, BulkStatus::Completed);
        assert_eq!(op.total, 3);
        assert_eq!(op.succeeded, 2);
        assert_eq!(op.failed, 1);
        let failed: Vec<&str> = op
            .results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(failed, vec!["taken"]);
        assert!(repo.stored("one").is_some());

        let polled = runner.tracker().get(op.id).await.unwrap();
        assert_eq!(polled.processed(), 3);
    }

    #[tokio::test]
    async fn all_failures_mark_operation_failed() {
        let (runner, _) = runner(vec![]);
        let op = runner
            .user_action(BulkAction::Disable, vec!["ghost".into(), "phantom".into()])
            .await
            .unwrap();
        assert_eq!(op.status, BulkStatus::Failed);
        assert_eq!(op.failed, 2);
    }

    #[tokio::test]
    async fn create_is_not_a_name_action() {
        let (runner, _) = runner(vec![]);
        assert!(runner.user_action(BulkAction::Create, vec![]).await.is_err());
        assert!(runner
            .group_action(BulkAction::ResetOtp, vec!["ops".into()])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn history_is_capped_per_kind() {
        let tracker = BulkTracker::new();
        let mut first = None;
        for _ in 0..HISTORY_LIMIT + 5 {
            let id = tracker.begin(BulkKind::Users, BulkAction::Enable, 0).await;
            first.get_or_insert(id);
            tracker.finish(id).await;
        }
        let group_id = tracker.begin(BulkKind::Groups, BulkAction::Delete, 0).await;
        tracker.finish(group_id).await;

        assert_eq!(tracker.history(BulkKind::Users, 100).await.len(), HISTORY_LIMIT);
        assert_eq!(tracker.history(BulkKind::Groups, 100).await.len(), 1);
        assert!(tracker.get(first.unwrap()).await.is_none());
        assert_eq!(tracker.history(BulkKind::Users, 3).await.len(), 3);
    }
}
