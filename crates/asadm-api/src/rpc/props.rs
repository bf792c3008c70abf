// Property store methods
//
// `UserPropPut`, `UserPropDel`, `UserPropDelete` and `UserPropMultiGet`
// operate on both users and groups; the `type` property tells them apart.

use tracing::debug;

use crate::error::Error;
use crate::property::PropertyBag;
use crate::rpc::client::AsClient;
use crate::xmlrpc::{MethodCall, Value};

/// One entity's name and its flat properties as returned by a multi-get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub props: PropertyBag,
}

impl AsClient {
    /// Create or overwrite properties on an entity.
    ///
    /// `UserPropPut(name, struct, false)`
    pub async fn prop_put(&self, name: &str, props: &PropertyBag) -> Result<(), Error> {
        debug!(name, count = props.len(), "putting properties");
        self.invoke(
            MethodCall::new("UserPropPut")
                .arg(name)
                .arg(props.to_struct())
                .arg(false),
        )
        .await?;
        Ok(())
    }

    /// Remove named properties from an entity.
    ///
    /// `UserPropDel(name, [names])`
    pub async fn prop_del<S: AsRef<str>>(&self, name: &str, keys: &[S]) -> Result<(), Error> {
        debug!(name, count = keys.len(), "deleting properties");
        let keys: Value = keys.iter().map(|k| k.as_ref()).collect();
        self.invoke(MethodCall::new("UserPropDel").arg(name).arg(keys))
            .await?;
        Ok(())
    }

    /// Delete an entity outright.
    ///
    /// `UserPropDelete(name)`
    pub async fn prop_delete(&self, name: &str) -> Result<(), Error> {
        debug!(name, "deleting entity");
        self.invoke(MethodCall::new("UserPropDelete").arg(name))
            .await?;
        Ok(())
    }

    /// Fetch profiles for the given names, or every profile when `None`.
    ///
    /// `UserPropMultiGet([names] | nil, nil)`. The result struct is keyed
    /// by entity name; members whose value is not a struct are skipped.
    pub async fn multi_get(&self, names: Option<&[&str]>) -> Result<Vec<Profile>, Error> {
        let filter: Value = names.map(|n| n.iter().copied().collect::<Value>()).into();
        let value = self
            .invoke(
                MethodCall::new("UserPropMultiGet")
                    .arg(filter)
                    .arg(Value::Nil),
            )
            .await?;

        let profiles = match value {
            Value::Struct(members) => members
                .into_iter()
                .filter_map(|m| {
                    let props = PropertyBag::from_struct(m.value.as_struct()?);
                    Some(Profile {
                        name: m.name,
                        props,
                    })
                })
                .collect(),
            Value::Nil => Vec::new(),
            other => {
                return Err(Error::Malformed {
                    message: format!("UserPropMultiGet returned {other}, expected struct"),
                    body: String::new(),
                });
            }
        };
        debug!(count = profiles.len(), "fetched profiles");
        Ok(profiles)
    }

    /// Fetch a single profile by exact name.
    pub async fn get_profile(&self, name: &str) -> Result<Option<Profile>, Error> {
        let mut profiles = self.multi_get(Some(std::slice::from_ref(&name))).await?;
        let idx = profiles.iter().position(|p| p.name == name);
        Ok(idx.map(|i| profiles.swap_remove(i)))
    }
}
