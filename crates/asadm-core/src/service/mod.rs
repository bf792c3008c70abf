// ── Services ──
//
// Business operations over the repository traits. Each service receives
// its collaborators at construction.

pub mod groups;
pub mod status;
pub mod users;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod memory;

pub use groups::GroupService;
pub use status::StatusService;
pub use users::{BUILTIN_ADMIN, UserService};
