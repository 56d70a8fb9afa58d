#![doc = include_str!("../README.md")]

mod common;
pub use common::*;

/// Generated protobuf messages and gRPC bindings for `proto/frame.proto`.
///
/// - [`GetFrameRequest`](proto::GetFrameRequest) carries the requested `id`.
/// - [`Frame`](proto::Frame) carries the same `id` back.
/// - [`frame_service_server`](proto::frame_service_server) and
///   [`frame_service_client`](proto::frame_service_client) hold the tonic
///   server trait and client stub.
pub mod proto {
    tonic::include_proto!("frame");

    /// Encoded `FileDescriptorSet` for `frame.proto`, registered with the
    /// reflection service.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("frame_descriptor");
}
