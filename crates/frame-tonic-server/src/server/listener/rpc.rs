//! gRPC listener for `frame.FrameService`.
//!
//! Alongside the frame service the tonic server carries the usual operational
//! companions: `grpc.health.v1.Health` reporting the frame service as serving,
//! server reflection, gRPC-Web with permissive CORS, and zstd/gzip/deflate
//! compression. Every connection and every HTTP/2 stream is driven on its own
//! task, so a slow or failing call never holds up another.

use crate::server::{
    config::ListenerConfig,
    error::ListenerError,
    listener::{ListenerKind, bind_tcp},
    service::handler::FrameHandler,
};
use frame_tonic_core::proto::{FILE_DESCRIPTOR_SET, frame_service_server::FrameServiceServer};
use futures::Stream;
#[cfg(test)]
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::server::Connected;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

const KIND: ListenerKind = ListenerKind::Rpc;

/// A bound gRPC listener that has not started serving yet.
#[derive(Debug)]
pub struct RpcListener {
    listener: TcpListener,
}

impl RpcListener {
    /// Binds the configured address. Fails with [`ListenerError::Bind`]
    /// without serving anything.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let listener = bind_tcp(KIND, &config.addr).await?;
        Ok(Self { listener })
    }

    /// The address actually bound, which differs from the configured one when
    /// port `0` was requested.
    #[cfg(test)]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr().expect("bound listener has an address")
    }

    /// Serves gRPC on the bound socket until the transport fails.
    pub async fn serve(self) -> Result<(), ListenerError> {
        #[cfg(feature = "tracing")]
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!("Serving frame gRPC service on {addr}");
        }

        serve_with_incoming(TcpListenerStream::new(self.listener)).await
    }

    /// Binds and then serves. This is what the host runs for the RPC
    /// listener.
    pub async fn start(config: ListenerConfig) -> Result<(), ListenerError> {
        Self::bind(&config).await?.serve().await
    }
}

async fn serve_with_incoming<I, IO, IE>(incoming: I) -> Result<(), ListenerError>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<tower::BoxError>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<FrameServiceServer<FrameHandler>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()
        .map_err(|e| ListenerError::serve(KIND, e))?;

    Server::builder()
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_frame_service(FrameHandler::new()))
        .serve_with_incoming(incoming)
        .await
        .map_err(|e| ListenerError::serve(KIND, e))
}

fn build_frame_service(handler: FrameHandler) -> FrameServiceServer<FrameHandler> {
    FrameServiceServer::new(handler)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}
