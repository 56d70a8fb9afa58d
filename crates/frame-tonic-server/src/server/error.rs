//! Error types for listeners and the service host.
//!
//! Listener tasks never end the process themselves. They return a
//! [`ListenerError`] and the host wraps the first one it observes in a
//! [`HostError`], which `main` turns into exit status 1.

use crate::server::listener::ListenerKind;
use std::io;
use tower::BoxError;

/// Terminal failure of a single listener.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The configured address could not be bound (in use, invalid, permission
    /// denied). Nothing was served.
    #[error("failed to bind {listener} listener on {addr}")]
    Bind {
        listener: ListenerKind,
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The listener was bound but its serve loop ended abnormally.
    #[error("{listener} listener stopped serving")]
    Serve {
        listener: ListenerKind,
        #[source]
        source: BoxError,
    },
}

impl ListenerError {
    pub fn serve(listener: ListenerKind, source: impl Into<BoxError>) -> Self {
        Self::Serve {
            listener,
            source: source.into(),
        }
    }

    /// Which listener this error belongs to.
    pub fn listener(&self) -> ListenerKind {
        match self {
            Self::Bind { listener, .. } | Self::Serve { listener, .. } => *listener,
        }
    }
}

/// Process-level failure reported by the service host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("{listener} listener failed")]
    ListenerFailed {
        listener: ListenerKind,
        #[source]
        source: ListenerError,
    },
}

impl HostError {
    #[cfg(test)]
    pub fn listener(&self) -> ListenerKind {
        match self {
            Self::ListenerFailed { listener, .. } => *listener,
        }
    }
}

impl From<ListenerError> for HostError {
    fn from(source: ListenerError) -> Self {
        Self::ListenerFailed {
            listener: source.listener(),
            source,
        }
    }
}

/// Renders an error and its source chain on one line, e.g. `failed to bind rpc
/// listener on 0.0.0.0:8080: Address already in use (os error 98)`.
pub fn report(err: &(dyn std::error::Error + 'static)) -> String {
    anyhow::Chain::new(err)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}
