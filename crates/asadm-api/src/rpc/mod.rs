// Typed access to the appliance's remote methods.
//
// `AsClient` owns the transport and the decode step; the remote methods
// are inherent methods grouped by concern in the sibling files.

pub mod account;
pub mod client;
pub mod props;
pub mod server;

pub use client::AsClient;
pub use props::Profile;
pub use server::DaemonStatus;
