use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::camera::device::{CameraDevice, CameraError, CameraStream, StreamRequest};
use crate::foundation::core::Frame;
use crate::foundation::error::{BoothError, BoothResult};

/// In-process camera for tests, demos and the CLI.
///
/// Produces deterministic frames (a horizontal ramp, so mirroring is
/// observable) and can be configured to fail acquisition with either
/// [`CameraError`]. Clones share the open/close counters, letting tests hold
/// a probe while the session owns the boxed device.
#[derive(Clone, Debug)]
pub struct SyntheticCamera {
    frame_width: u32,
    frame_height: u32,
    deny: Option<CameraError>,
    opens: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    grabs: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    /// Camera delivering frames of the given size.
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            deny: None,
            opens: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
            grabs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Camera whose every `open` fails with `err`.
    pub fn failing(err: CameraError) -> Self {
        let mut cam = Self::new(2, 2);
        cam.deny = Some(err);
        cam
    }

    /// Total successful `open` calls so far.
    pub fn opened_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Streams currently open (opened and not yet closed).
    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl CameraDevice for SyntheticCamera {
    fn open(&mut self, _request: &StreamRequest) -> Result<Box<dyn CameraStream>, CameraError> {
        if let Some(err) = &self.deny {
            return Err(err.clone());
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticStream {
            width: self.frame_width,
            height: self.frame_height,
            grabs: self.grabs.clone(),
            live: self.live.clone(),
            closed: false,
        }))
    }
}

struct SyntheticStream {
    width: u32,
    height: u32,
    grabs: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    closed: bool,
}

impl CameraStream for SyntheticStream {
    fn grab_frame(&mut self) -> BoothResult<Frame> {
        if self.closed {
            return Err(BoothError::flow("grab_frame on a closed stream"));
        }
        // Camera-wide counter so every grabbed frame differs, including the
        // first grab of a re-opened stream after a retake.
        let stamp = (self.grabs.fetch_add(1, Ordering::SeqCst) + 1) as u8;
        let mut rgba8 = Vec::with_capacity((self.width * self.height * 4) as usize);
        let denom = self.width.saturating_sub(1).max(1);
        for _y in 0..self.height {
            for x in 0..self.width {
                let ramp = ((x * 255) / denom) as u8;
                rgba8.extend_from_slice(&[ramp, stamp, 128, 255]);
            }
        }
        Frame::new(self.width, self.height, rgba8)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_grab_close_tracks_counters() {
        let mut cam = SyntheticCamera::new(4, 2);
        let probe = cam.clone();
        let mut stream = cam.open(&StreamRequest::default()).unwrap();
        assert_eq!(probe.opened_count(), 1);
        assert_eq!(probe.live_streams(), 1);

        let frame = stream.grab_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (4, 2));

        stream.close();
        stream.close();
        assert_eq!(probe.live_streams(), 0);
        assert!(stream.grab_frame().is_err());
    }

    #[test]
    fn frames_ramp_left_to_right_and_vary_per_grab() {
        let mut cam = SyntheticCamera::new(3, 1);
        let mut stream = cam.open(&StreamRequest::default()).unwrap();
        let a = stream.grab_frame().unwrap();
        let b = stream.grab_frame().unwrap();
        assert_ne!(a, b);

        let mirrored = a.mirrored();
        assert_ne!(a, mirrored);
    }

    #[test]
    fn failing_camera_denies_open() {
        let mut cam = SyntheticCamera::failing(CameraError::PermissionDenied);
        let probe = cam.clone();
        let err = cam.open(&StreamRequest::default()).err();
        assert_eq!(err, Some(CameraError::PermissionDenied));
        assert_eq!(probe.opened_count(), 0);
    }
}
