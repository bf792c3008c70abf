// Server-level methods
//
// Configuration dump, live VPN status, disconnects and warm restart.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Error;
use crate::rpc::client::AsClient;
use crate::xmlrpc::{MethodCall, Value};

/// Message shown to clients kicked without an explicit reason.
pub const DEFAULT_DISCONNECT_MESSAGE: &str = "Disconnected by administrator";

/// Client rows reported by one `openvpn_*` daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonStatus {
    pub name: String,
    /// Each row is the daemon's `client_list` entry, stringified.
    pub clients: Vec<Vec<String>>,
}

impl AsClient {
    /// Restart the VPN service without dropping the admin UI.
    ///
    /// `RunStart("warm", nil)`
    pub async fn run_start(&self) -> Result<(), Error> {
        debug!("requesting warm restart");
        self.invoke(MethodCall::new("RunStart").arg("warm").arg(Value::Nil))
            .await?;
        Ok(())
    }

    /// Fetch the effective configuration as a flat key/value map.
    ///
    /// `ConfigDefaults(nil)`. Scalars are rendered as text, arrays are
    /// flattened and comma-joined, empty values are dropped.
    pub async fn config_defaults(&self) -> Result<IndexMap<String, String>, Error> {
        let value = self
            .invoke(MethodCall::new("ConfigDefaults").arg(Value::Nil))
            .await?;
        let members = match value {
            Value::Struct(members) => members,
            other => {
                return Err(Error::Malformed {
                    message: format!("ConfigDefaults returned {other}, expected struct"),
                    body: String::new(),
                });
            }
        };

        let mut out = IndexMap::with_capacity(members.len());
        for m in members {
            let text = match &m.value {
                Value::Array(items) => {
                    let mut flat = Vec::new();
                    flatten_scalars(items, &mut flat);
                    flat.join(",")
                }
                other => other.scalar_text().unwrap_or_default(),
            };
            if !text.is_empty() {
                out.insert(m.name, text);
            }
        }
        debug!(keys = out.len(), "fetched configuration");
        Ok(out)
    }

    /// Fetch live client tables for every VPN daemon.
    ///
    /// `GetVPNStatus()`. Only top-level members named `openvpn_*` are
    /// daemons; each carries a `client_list` array of row arrays.
    pub async fn vpn_status(&self) -> Result<Vec<DaemonStatus>, Error> {
        let value = self.invoke(MethodCall::new("GetVPNStatus")).await?;
        let Some(members) = value.as_struct() else {
            return Ok(Vec::new());
        };

        let daemons: Vec<DaemonStatus> = members
            .iter()
            .filter(|m| m.name.starts_with("openvpn_"))
            .map(|m| {
                let clients = m
                    .value
                    .member("client_list")
                    .and_then(Value::as_array)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(Value::as_array)
                    .map(|row| {
                        row.iter()
                            .map(|cell| cell.scalar_text().unwrap_or_default())
                            .collect()
                    })
                    .collect();
                DaemonStatus {
                    name: m.name.clone(),
                    clients,
                }
            })
            .collect();
        debug!(daemons = daemons.len(), "fetched VPN status");
        Ok(daemons)
    }

    /// Disconnect the named users.
    ///
    /// `DisconnectUsers([users], false, nil, message, false)`
    pub async fn disconnect_users<S: AsRef<str>>(
        &self,
        users: &[S],
        message: Option<&str>,
    ) -> Result<(), Error> {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_DISCONNECT_MESSAGE);
        debug!(count = users.len(), message, "disconnecting users");
        let users: Value = users.iter().map(|u| u.as_ref()).collect();
        self.invoke(
            MethodCall::new("DisconnectUsers")
                .arg(users)
                .arg(false)
                .arg(Value::Nil)
                .arg(message)
                .arg(false),
        )
        .await?;
        Ok(())
    }
}

fn flatten_scalars(items: &[Value], out: &mut Vec<String>) {
    for item in items {
        match item {
            Value::Array(nested) => flatten_scalars(nested, out),
            other => {
                if let Some(text) = other.scalar_text() {
                    out.push(text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_arrays_flatten_in_order() {
        let items = vec![
            Value::from("a"),
            Value::Array(vec![Value::from("b"), Value::Int(3)]),
            Value::Nil,
            Value::Boolean(true),
        ];
        let mut out = Vec::new();
        flatten_scalars(&items, &mut out);
        assert_eq!(out.join(","), "a,b,3,true");
    }
}
