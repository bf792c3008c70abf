// ── Directory collaborator ──
//
// LDAP-authenticated users must also exist in the directory. The lookup
// itself lives outside this crate; services only see this trait.

use async_trait::async_trait;

use crate::error::CoreError;

#[async_trait]
pub trait DirectoryCheck: Send + Sync {
    /// `Ok(())` when the directory knows `username`.
    async fn check_user_exists(&self, username: &str) -> Result<(), CoreError>;
}

/// Accepts every username. Used when no directory is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

#[async_trait]
impl DirectoryCheck for NoDirectory {
    async fn check_user_exists(&self, _username: &str) -> Result<(), CoreError> {
        Ok(())
    }
}
