// XML-RPC wire format
//
// Value model, request encoder and response decoder for the subset of
// XML-RPC the appliance speaks.

pub mod decode;
pub mod encode;
pub mod value;

pub use decode::{RpcOutcome, decode_response};
pub use encode::MethodCall;
pub use value::{Member, Value};

use crate::error::Error;

impl RpcOutcome {
    /// Fold the outcome into the crate error type.
    ///
    /// `body` is the raw response text, kept on `Malformed` for diagnostics.
    pub fn into_result(self, body: &str) -> Result<Value, Error> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Fault { code, message } => Err(Error::Fault { code, message }),
            Self::Malformed { reason } => Err(Error::Malformed {
                message: reason,
                body: body.to_owned(),
            }),
        }
    }
}
