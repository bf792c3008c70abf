// ── Domain model ──

pub mod filter;
pub mod group;
pub mod mac;
pub mod server;
pub mod status;
pub mod user;

pub use filter::{GroupFilter, Page, SortField, SortOrder, UserFilter};
pub use group::{Group, GroupUpdate};
pub use mac::MacAddress;
pub use server::{NetworkConfig, ServerInfo};
pub use status::{ConnectedUser, VpnStatusSummary};
pub use user::{AuthMethod, DEFAULT_GROUP, IpAssignMode, NewUser, Role, User, UserUpdate};
