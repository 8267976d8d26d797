use tracing::debug;

use crate::camera::device::{CameraDevice, CameraStream, StreamRequest};
use crate::delivery::{Delivery, Submission};
use crate::foundation::core::ImagePayload;
use crate::foundation::error::{BoothError, BoothResult};
use crate::session::countdown::{Countdown, CountdownStep};

/// One of the seven mutually exclusive view steps.
///
/// The host renders exactly one view per step, driven solely by this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    Start,
    Camera,
    Preview,
    Processing,
    Result,
    Form,
    Finish,
}

impl Step {
    /// All steps, in guided-flow order.
    pub const ALL: [Step; 7] = [
        Step::Start,
        Step::Camera,
        Step::Preview,
        Step::Processing,
        Step::Result,
        Step::Form,
        Step::Finish,
    ];
}

/// Contact details collected before submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContactInfo {
    pub handle: String,
    pub email: String,
}

impl ContactInfo {
    pub fn new(handle: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            email: email.into(),
        }
    }

    /// Both fields must be non-empty after trimming.
    pub fn validate(&self) -> BoothResult<()> {
        if self.handle.trim().is_empty() {
            return Err(BoothError::validation("contact handle must be non-empty"));
        }
        if self.email.trim().is_empty() {
            return Err(BoothError::validation("contact email must be non-empty"));
        }
        Ok(())
    }
}

/// Matches a compositor result to the `approve` that requested it.
///
/// Minted fresh per approval; results carrying an older token are ignored,
/// so a composite finishing after a reset or re-capture cannot clobber the
/// session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComposeToken(u64);

/// Work order handed to the host when a preview is approved.
///
/// The host runs the image through the compositor (off the interaction path
/// if it likes) and reports back via [`Session::finish_processing`].
#[derive(Clone, Debug)]
pub struct ComposeRequest {
    pub token: ComposeToken,
    pub image: ImagePayload,
}

/// Outcome of one countdown tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickEvent {
    /// No countdown armed (late timer after retake/reset); nothing happened.
    Idle,
    /// Countdown still running; display this value.
    Counting(u8),
    /// Countdown hit zero and the capture committed; now in Preview.
    Captured,
}

enum State {
    Start,
    Camera {
        stream: Box<dyn CameraStream>,
        countdown: Option<Countdown>,
    },
    Preview {
        captured: ImagePayload,
    },
    Processing {
        captured: ImagePayload,
        token: ComposeToken,
    },
    Result {
        final_image: ImagePayload,
    },
    Form {
        final_image: ImagePayload,
        contact: ContactInfo,
    },
    Finish,
}

impl State {
    fn step(&self) -> Step {
        match self {
            State::Start => Step::Start,
            State::Camera { .. } => Step::Camera,
            State::Preview { .. } => Step::Preview,
            State::Processing { .. } => Step::Processing,
            State::Result { .. } => Step::Result,
            State::Form { .. } => Step::Form,
            State::Finish => Step::Finish,
        }
    }
}

/// The guided photo booth flow.
///
/// Owns the current step, the countdown, captured/composited payloads and
/// the camera stream. Commands are synchronous `&mut self` calls processed
/// one at a time against committed state; each returns a typed error with
/// the state already at its defined fallback step, so no failure is fatal.
///
/// The camera stream is held exactly while `step() == Step::Camera`; it is
/// closed on every exit path, including drop.
pub struct Session {
    device: Box<dyn CameraDevice>,
    request: StreamRequest,
    state: State,
    next_token: u64,
}

impl Session {
    /// New session in the start step. `request` is used for every stream
    /// acquisition (initial start and retakes).
    pub fn new(device: Box<dyn CameraDevice>, request: StreamRequest) -> Self {
        Self {
            device,
            request,
            state: State::Start,
            next_token: 0,
        }
    }

    pub fn step(&self) -> Step {
        self.state.step()
    }

    /// Displayed countdown value while a capture is pending.
    pub fn countdown_value(&self) -> Option<u8> {
        match &self.state {
            State::Camera {
                countdown: Some(c), ..
            } => Some(c.value()),
            _ => None,
        }
    }

    /// The raw captured payload, present in Preview and Processing.
    pub fn captured_image(&self) -> Option<&ImagePayload> {
        match &self.state {
            State::Preview { captured } | State::Processing { captured, .. } => Some(captured),
            _ => None,
        }
    }

    /// The composited payload, present from Result onward.
    pub fn final_image(&self) -> Option<&ImagePayload> {
        match &self.state {
            State::Result { final_image } | State::Form { final_image, .. } => Some(final_image),
            _ => None,
        }
    }

    /// The contact draft, present in Form.
    pub fn contact(&self) -> Option<&ContactInfo> {
        match &self.state {
            State::Form { contact, .. } => Some(contact),
            _ => None,
        }
    }

    /// Start the experience: acquire the camera and enter the camera step.
    ///
    /// On acquisition failure the session stays in Start and the error is
    /// returned for the host to surface.
    pub fn start(&mut self) -> BoothResult<()> {
        if !matches!(self.state, State::Start) {
            return Err(BoothError::flow("start is only valid in the start step"));
        }
        let stream = self.device.open(&self.request)?;
        self.transition(State::Camera {
            stream,
            countdown: None,
        });
        Ok(())
    }

    /// Arm the 3-2-1 countdown. Rejected while one is already running (the
    /// capture control is disabled for the full countdown duration).
    pub fn request_capture(&mut self) -> BoothResult<()> {
        match &mut self.state {
            State::Camera { countdown, .. } => {
                if countdown.is_some() {
                    return Err(BoothError::flow(
                        "capture is disabled while a countdown is running",
                    ));
                }
                *countdown = Some(Countdown::new());
                Ok(())
            }
            _ => Err(BoothError::flow(
                "request_capture is only valid in the camera step",
            )),
        }
    }

    /// Advance the countdown by one tick (host-scheduled at 1 s intervals).
    ///
    /// The third tick fires the capture: the current frame is grabbed,
    /// mirrored horizontally, losslessly encoded, the stream is closed and
    /// the session enters Preview. Ticks with no countdown armed are inert,
    /// so a timer firing late after a retake or reset is harmless.
    pub fn tick(&mut self) -> BoothResult<TickEvent> {
        let State::Camera { stream, countdown } = &mut self.state else {
            return Ok(TickEvent::Idle);
        };
        let Some(mut c) = countdown.take() else {
            return Ok(TickEvent::Idle);
        };

        match c.tick() {
            CountdownStep::Show(v) => {
                *countdown = Some(c);
                Ok(TickEvent::Counting(v))
            }
            CountdownStep::Fire => {
                // Countdown stays disarmed on failure so the user can retry
                // the capture; the stream is kept and the step is unchanged.
                let frame = stream.grab_frame()?;
                let captured = ImagePayload::encode_png(frame.mirrored())?;
                let State::Camera { mut stream, .. } =
                    std::mem::replace(&mut self.state, State::Preview { captured })
                else {
                    unreachable!("tick fired outside the camera step");
                };
                stream.close();
                debug!(from = ?Step::Camera, to = ?Step::Preview, "transition");
                Ok(TickEvent::Captured)
            }
        }
    }

    /// Discard the captured image and reopen the camera for another try.
    ///
    /// On acquisition failure the session stays in Preview with the captured
    /// image retained.
    pub fn retake(&mut self) -> BoothResult<()> {
        if !matches!(self.state, State::Preview { .. }) {
            return Err(BoothError::flow("retake is only valid in the preview step"));
        }
        let stream = self.device.open(&self.request)?;
        self.transition(State::Camera {
            stream,
            countdown: None,
        });
        Ok(())
    }

    /// Approve the captured image and enter Processing.
    ///
    /// Returns the work order the host feeds through the compositor; the
    /// result comes back via [`Session::finish_processing`].
    pub fn approve(&mut self) -> BoothResult<ComposeRequest> {
        let State::Preview { captured } = &self.state else {
            return Err(BoothError::flow("approve is only valid in the preview step"));
        };
        let captured = captured.clone();
        self.next_token += 1;
        let token = ComposeToken(self.next_token);
        self.transition(State::Processing {
            captured: captured.clone(),
            token,
        });
        Ok(ComposeRequest {
            token,
            image: captured,
        })
    }

    /// Apply a compositor outcome.
    ///
    /// A success stores the final image and enters Result; a failure reverts
    /// to Preview with the captured image retained and returns the error for
    /// the host to surface. Results whose token no longer matches the
    /// session (reset or re-approved since) are ignored.
    pub fn finish_processing(
        &mut self,
        token: ComposeToken,
        result: BoothResult<ImagePayload>,
    ) -> BoothResult<()> {
        let captured = match &self.state {
            State::Processing {
                token: current,
                captured,
            } if *current == token => captured.clone(),
            _ => {
                debug!(?token, "ignoring stale compositor result");
                return Ok(());
            }
        };

        match result {
            Ok(final_image) => {
                self.transition(State::Result { final_image });
                Ok(())
            }
            Err(err) => {
                self.transition(State::Preview { captured });
                Err(err)
            }
        }
    }

    /// Leave the result screen for the contact form.
    pub fn advance_to_form(&mut self) -> BoothResult<()> {
        let State::Result { final_image } = &self.state else {
            return Err(BoothError::flow(
                "advance_to_form is only valid in the result step",
            ));
        };
        let final_image = final_image.clone();
        self.transition(State::Form {
            final_image,
            contact: ContactInfo::default(),
        });
        Ok(())
    }

    /// Replace the contact draft.
    pub fn update_contact(&mut self, contact: ContactInfo) -> BoothResult<()> {
        match &mut self.state {
            State::Form { contact: c, .. } => {
                *c = contact;
                Ok(())
            }
            _ => Err(BoothError::flow(
                "update_contact is only valid in the form step",
            )),
        }
    }

    /// Validate the contact draft and hand `{contact, image}` to the
    /// delivery collaborator, then enter Finish.
    ///
    /// Validation or delivery failure keeps the session in Form.
    pub fn submit(&mut self, delivery: &mut dyn Delivery) -> BoothResult<()> {
        let State::Form {
            final_image,
            contact,
        } = &self.state
        else {
            return Err(BoothError::flow("submit is only valid in the form step"));
        };
        contact.validate()?;
        delivery.deliver(Submission {
            contact: contact.clone(),
            image: final_image.clone(),
        })?;
        self.transition(State::Finish);
        Ok(())
    }

    /// Return to Start, clearing all captured/composited data and contact
    /// details and closing the stream if held. Valid from any step.
    pub fn reset(&mut self) {
        self.close_stream();
        self.transition(State::Start);
    }

    fn transition(&mut self, to: State) {
        let from = self.state.step();
        let to_step = to.step();
        self.state = to;
        debug!(from = ?from, to = ?to_step, "transition");
    }

    fn close_stream(&mut self) {
        if let State::Camera { stream, .. } = &mut self.state {
            stream.close();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // App teardown path: never leave a device open.
        self.close_stream();
    }
}
