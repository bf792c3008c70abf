// asadm-api: Async client for the OpenVPN Access Server XML-RPC endpoint
//
// Provides the XML-RPC wire format (encoder, decoder, value model), the
// HTTPS transport with per-call Basic Auth, flat property-bag helpers,
// and typed wrappers for each remote administration method.

pub mod error;
pub mod property;
pub mod rpc;
pub mod transport;
pub mod xmlrpc;

pub use error::Error;
pub use property::{HW_ADDR_SLOTS, PropertyBag};
pub use rpc::{AsClient, DaemonStatus, Profile};
pub use transport::{TlsMode, Transport, TransportConfig};
pub use xmlrpc::{Member, MethodCall, RpcOutcome, Value};
