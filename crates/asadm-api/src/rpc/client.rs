// XML-RPC client
//
// Encodes a `MethodCall`, posts it through the transport, rejects any
// non-200 status, and runs the body through the single decoder. Every
// remote method in this crate funnels through `invoke`.

use tracing::{debug, warn};

use crate::error::Error;
use crate::transport::Transport;
use crate::xmlrpc::{MethodCall, Value, decode_response};

/// Client for the appliance's `/RPC2/` administration endpoint.
///
/// Holds no session state: credentials ride on every request.
pub struct AsClient {
    transport: Transport,
}

impl AsClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Invoke one remote method and return its decoded result value.
    pub async fn invoke(&self, call: MethodCall) -> Result<Value, Error> {
        let method = call.method;
        debug!(method, params = call.params.len(), "invoking");

        let resp = self.transport.call(call.to_xml()).await?;
        if !resp.is_ok() {
            warn!(method, status = resp.status, "non-200 response");
            return Err(Error::Status {
                status: resp.status,
                body: resp.body,
            });
        }

        let result = decode_response(&resp.body).into_result(&resp.body);
        if let Err(ref e) = result {
            debug!(method, error = %e, "call failed");
        }
        result
    }
}
