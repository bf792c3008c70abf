// Credential methods

use tracing::debug;

use crate::error::Error;
use crate::rpc::client::AsClient;
use crate::xmlrpc::{MethodCall, Value};

impl AsClient {
    /// Set the local-auth password for a user.
    ///
    /// `SetLocalPassword(user, password, nil, true)`
    pub async fn set_local_password(&self, user: &str, password: &str) -> Result<(), Error> {
        debug!(user, "setting local password");
        self.invoke(
            MethodCall::new("SetLocalPassword")
                .arg(user)
                .arg(password)
                .arg(Value::Nil)
                .arg(true),
        )
        .await?;
        Ok(())
    }

    /// Regenerate a user's TOTP secret.
    ///
    /// `GoogleAuthenticatorRegenerate(user, 0)`
    pub async fn regenerate_totp(&self, user: &str) -> Result<(), Error> {
        debug!(user, "regenerating TOTP secret");
        self.invoke(
            MethodCall::new("GoogleAuthenticatorRegenerate")
                .arg(user)
                .arg(0_i64),
        )
        .await?;
        Ok(())
    }
}
