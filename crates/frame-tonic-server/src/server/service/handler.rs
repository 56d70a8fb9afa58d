//! gRPC service implementation for frame lookups.
//!
//! This module defines [`FrameHandler`], the concrete implementation of the
//! [`FrameService`] gRPC service defined in `frame.proto`. The service is
//! stateless: every call is answered from its own request alone, so the
//! handler can be cloned freely and invoked from any number of connections
//! at once.
//!
//! Every method of the generated trait is implemented here. Paths that are not
//! part of the contract never reach this type; tonic answers them with
//! `Unimplemented`.

use crate::server::telemetry::increment_frames_served;
use frame_tonic_core::proto::{Frame, GetFrameRequest, frame_service_server::FrameService};
use tonic::{Request, Response, Status};

/// Stateless handler for `frame.FrameService`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameHandler;

impl FrameHandler {
    pub const fn new() -> Self {
        Self
    }
}

/// Builds the frame addressed by `req`. The frame always carries the requested
/// id unchanged.
pub fn frame_for(req: &GetFrameRequest) -> Frame {
    Frame { id: req.id }
}

#[tonic::async_trait]
impl FrameService for FrameHandler {
    /// Returns the frame for the requested id. Any `int32` is accepted,
    /// including zero and negative ids, and the call cannot fail.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(id = req.get_ref().id)))]
    async fn get_frame(&self, req: Request<GetFrameRequest>) -> Result<Response<Frame>, Status> {
        let frame = frame_for(req.get_ref());
        increment_frames_served();
        Ok(Response::new(frame))
    }
}
