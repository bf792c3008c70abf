//! Command dispatch: bridges CLI args -> core services -> output formatting.

pub mod bulk;
pub mod config_cmd;
pub mod groups;
pub mod server;
pub mod status;
pub mod users;
pub mod util;

use std::sync::Arc;

use asadm_core::{
    ApplianceConfig, BulkRunner, BulkTracker, GroupService, NoDirectory, RpcRepository,
    StatusService, UserService,
};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Services wired against one appliance.
pub struct Services {
    pub users: Arc<UserService>,
    pub groups: Arc<GroupService>,
    pub status: StatusService,
    pub tracker: Arc<BulkTracker>,
}

impl Services {
    pub fn connect(config: &ApplianceConfig) -> Result<Self, CliError> {
        let repo = Arc::new(RpcRepository::new(config.connect()?));
        let users = Arc::new(UserService::new(
            repo.clone(),
            repo.clone(),
            Arc::new(NoDirectory),
        ));
        let groups = Arc::new(GroupService::new(repo.clone(), repo.clone()));
        let status = StatusService::new(repo.clone(), repo.clone(), repo);
        Ok(Self {
            users,
            groups,
            status,
            tracker: Arc::new(BulkTracker::new()),
        })
    }

    pub fn bulk(&self, concurrency: usize) -> BulkRunner {
        BulkRunner::new(
            Arc::clone(&self.users),
            Arc::clone(&self.groups),
            Arc::clone(&self.tracker),
        )
        .with_concurrency(concurrency)
    }
}

/// Dispatch an appliance-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, services: &Services, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Users(args) => users::handle(services, args, global).await,
        Command::Groups(args) => groups::handle(services, args, global).await,
        Command::Status(args) => status::handle(services, args, global).await,
        Command::Disconnect { usernames, message } => {
            status::disconnect(services, &usernames, message.as_deref(), global).await
        }
        Command::Server(args) => server::handle(services, args, global).await,
        Command::Bulk(args) => bulk::handle(services, args, global).await,
        // Config and Completions are handled before a connection is made
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
