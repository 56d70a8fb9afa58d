//! Network listeners run by the service host.
//!
//! - [`rpc`] - tonic server exposing `frame.FrameService`.
//! - [`health`] - axum server exposing `/health`.
//!
//! Both listeners follow the same shape: `bind` claims the socket and fails
//! with [`ListenerError::Bind`], `serve` runs until the transport fails, and
//! `start` does both. They share no state.

pub mod health;
pub mod rpc;

use crate::server::error::ListenerError;
use core::fmt;
use tokio::net::TcpListener;

/// Identifies a listener in errors, logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Rpc,
    Health,
}

impl ListenerKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ListenerKind::Rpc => "rpc",
            ListenerKind::Health => "health",
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binds a TCP socket for `listener`, tagging any failure with the listener
/// and the address it tried.
async fn bind_tcp(listener: ListenerKind, addr: &str) -> Result<TcpListener, ListenerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind {
            listener,
            addr: addr.to_string(),
            source,
        })
}
