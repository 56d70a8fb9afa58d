//! Wire-level aliases for the frame contract.

/// Integer type of a frame identifier on the wire (`int32` in the proto).
pub type FrameId = i32;

/// Fully qualified name of the frame gRPC service, as registered with the
/// health and reflection services.
pub const FRAME_SERVICE_NAME: &str = "frame.FrameService";
