// asadm-core: Domain layer between asadm-api and its consumers (CLI).

pub mod bulk;
pub mod codec;
pub mod config;
pub mod directory;
pub mod error;
pub mod model;
pub mod network;
pub mod query;
pub mod repository;
pub mod service;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bulk::{BulkAction, BulkKind, BulkOperation, BulkRunner, BulkStatus, BulkTracker};
pub use config::{ApplianceConfig, DEFAULT_PORT, TlsVerification};
pub use directory::{DirectoryCheck, NoDirectory};
pub use error::{CoreError, EntityKind, RestoreOutcome, ValidationError};
pub use query::{ExpirationEntry, ExpirationStatus};
pub use repository::{
    ConfigRepository, DisconnectRepository, GroupRepository, RpcRepository, UserRepository,
    VpnStatusRepository,
};
pub use service::{GroupService, StatusService, UserService};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AuthMethod, ConnectedUser, DEFAULT_GROUP, Group, GroupFilter, GroupUpdate, IpAssignMode,
    MacAddress, NetworkConfig, NewUser, Page, Role, ServerInfo, SortField, SortOrder, User,
    UserFilter, UserUpdate, VpnStatusSummary,
};
