//! Types shared by the frame server and its clients.
//!
//! - [`error`] - handler-level [`Error`] and its `tonic::Status` mapping.
//! - [`types`] - wire-level aliases.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
