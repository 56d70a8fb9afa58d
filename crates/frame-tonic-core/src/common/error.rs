//! Error types for the frame service handler.
//!
//! The `GetFrame` handler itself never fails, so the variants here describe
//! failures a handler is allowed to report. `From<Error>` for `tonic::Status`
//! keeps the mapping onto gRPC status codes in one place.
//!
//! ## Error Cases
//! - `Unimplemented`: the method is part of the contract but has no handler.
//! - `Handler`: a handler-level failure, reported as an internal error.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for frame service handlers.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The method exists in the service contract but is not implemented.
    #[error("Method not implemented: {method}")]
    Unimplemented { method: &'static str },

    /// A handler failed while serving an otherwise valid request.
    #[error("Handler error: {reason}")]
    Handler { reason: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::Unimplemented { method } => {
                Status::unimplemented(format!("{method} is not implemented"))
            }
            Error::Handler { reason } => Status::internal(format!("Handler error: {reason}")),
        }
    }
}
