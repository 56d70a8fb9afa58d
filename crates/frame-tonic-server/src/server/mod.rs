//! Listener wiring and process-level orchestration for the frame service.
//!
//! - [`config`] - CLI/env configuration for both listeners.
//! - [`error`] - listener and host error types.
//! - [`host`] - the service host that runs both listeners and owns the exit
//!   decision.
//! - [`listener`] - the gRPC and HTTP health listeners.
//! - [`service`] - the `GetFrame` handler.
//! - [`telemetry`] - logging, tracing and metrics setup.

pub mod config;
pub mod error;
pub mod host;
pub mod listener;
pub mod service;
pub mod telemetry;
