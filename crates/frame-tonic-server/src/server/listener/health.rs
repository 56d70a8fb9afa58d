//! HTTP liveness listener.
//!
//! Serves a single route, [`HEALTH_PATH`], which answers every method with
//! `200 OK` and an empty body. Other paths fall through to the router's
//! default `404 Not Found`, also with an empty body.

use crate::server::{
    config::ListenerConfig,
    error::ListenerError,
    listener::{ListenerKind, bind_tcp},
    telemetry::increment_health_checks,
};
use axum::{Router, http::StatusCode, routing::any};
#[cfg(test)]
use std::net::SocketAddr;
use tokio::net::TcpListener;

const KIND: ListenerKind = ListenerKind::Health;

/// Path of the liveness check.
pub const HEALTH_PATH: &str = "/health";

/// Router with the liveness route and nothing else.
pub fn router() -> Router {
    Router::new().route(HEALTH_PATH, any(health))
}

async fn health() -> StatusCode {
    increment_health_checks();
    StatusCode::OK
}

/// A bound health listener that has not started serving yet.
#[derive(Debug)]
pub struct HealthListener {
    listener: TcpListener,
}

impl HealthListener {
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let listener = bind_tcp(KIND, &config.addr).await?;
        Ok(Self { listener })
    }

    #[cfg(test)]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr().expect("bound listener has an address")
    }

    pub async fn serve(self) -> Result<(), ListenerError> {
        #[cfg(feature = "tracing")]
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!("Serving health checks on http://{addr}{HEALTH_PATH}");
        }

        axum::serve(self.listener, router())
            .await
            .map_err(|e| ListenerError::serve(KIND, e))
    }

    pub async fn start(config: ListenerConfig) -> Result<(), ListenerError> {
        Self::bind(&config).await?.serve().await
    }
}
