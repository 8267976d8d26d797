use crate::foundation::core::Frame;
use crate::foundation::error::BoothResult;

/// Camera acquisition failure, surfaced distinctly per cause.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera device unavailable: {0}")]
    Unavailable(String),
}

/// Which way the requested camera should face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Selfie camera.
    #[default]
    Front,
    Rear,
}

/// Parameters for opening a live stream.
///
/// `ideal_*` are preferences, not guarantees; devices may deliver another
/// resolution and the session copes via the compositor's square crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreamRequest {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self {
            facing: Facing::Front,
            ideal_width: 1080,
            ideal_height: 1920,
        }
    }
}

/// Device boundary: anything that can hand out live camera streams.
pub trait CameraDevice {
    /// Open a stream, or fail with a [`CameraError`] the session surfaces
    /// without leaving its current step.
    fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// An exclusively owned live stream.
///
/// The session holds a stream only while in the camera step and calls
/// [`CameraStream::close`] on every exit path; implementations should make
/// `close` idempotent.
pub trait CameraStream {
    /// Grab the stream's current frame.
    fn grab_frame(&mut self) -> BoothResult<Frame>;

    /// Release the underlying device.
    fn close(&mut self);
}
