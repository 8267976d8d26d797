//! Snapbooth is the core of an interactive kiosk photo booth.
//!
//! Two pieces do the real work:
//!
//! - A [`Session`] state machine sequencing the guided flow: camera
//!   acquisition, 3-2-1 countdown capture, preview/approval, compositing,
//!   contact collection and submission handoff.
//! - A [`TemplateCompositor`] turning the captured photo into a fixed-size
//!   branded JPEG (gradient background, randomized decorative layer, square
//!   photo inset on a shadowed panel, caption and emblem overlay).
//!
//! The host owns the loop: it renders one view per [`Step`], schedules
//! countdown ticks, runs approved captures through the compositor and feeds
//! the result back. Camera and delivery are trait seams with synthetic and
//! in-memory implementations for tests and demos.
#![forbid(unsafe_code)]

pub mod camera;
pub mod delivery;
mod foundation;
pub mod session;
pub mod template;

pub use crate::foundation::core::{Frame, ImagePayload, Point, Rect};
pub use crate::foundation::error::{BoothError, BoothResult};

pub use crate::camera::device::{CameraDevice, CameraError, CameraStream, Facing, StreamRequest};
pub use crate::camera::synthetic::SyntheticCamera;
pub use crate::delivery::{Delivery, InMemoryDelivery, LogDelivery, Submission};
pub use crate::session::countdown::{COUNTDOWN_START, Countdown, CountdownStep};
pub use crate::session::machine::{
    ComposeRequest, ComposeToken, ContactInfo, Session, Step, TickEvent,
};
pub use crate::template::compositor::TemplateCompositor;
pub use crate::template::spec::TemplateSpec;
