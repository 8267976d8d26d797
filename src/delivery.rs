use tracing::info;

use crate::foundation::core::ImagePayload;
use crate::foundation::error::BoothResult;
use crate::session::machine::ContactInfo;

/// Handoff payload for a confirmed submission.
///
/// Contract: both contact fields are non-empty (the session validates before
/// delivering) and the image is the composited final output.
#[derive(Clone, Debug)]
pub struct Submission {
    pub contact: ContactInfo,
    pub image: ImagePayload,
}

/// Delivery collaborator receiving confirmed submissions.
///
/// Transport is out of scope for the core; implementations decide what
/// "deliver" means. A failure keeps the session on the form so the kiosk can
/// retry.
pub trait Delivery {
    fn deliver(&mut self, submission: Submission) -> BoothResult<()>;
}

/// Log-only delivery, the shipped default.
///
/// Records the handoff and drops the data, matching a kiosk running without
/// a configured transport.
#[derive(Debug, Default)]
pub struct LogDelivery;

impl Delivery for LogDelivery {
    fn deliver(&mut self, submission: Submission) -> BoothResult<()> {
        info!(
            handle = %submission.contact.handle,
            email = %submission.contact.email,
            image_bytes = submission.image.len(),
            "submission delivered (log only)"
        );
        Ok(())
    }
}

/// In-memory delivery for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryDelivery {
    submissions: Vec<Submission>,
}

impl InMemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submissions received so far, in order.
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }
}

impl Delivery for InMemoryDelivery {
    fn deliver(&mut self, submission: Submission) -> BoothResult<()> {
        self.submissions.push(submission);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_delivery_records_in_order() {
        let mut delivery = InMemoryDelivery::new();
        for handle in ["a", "b"] {
            delivery
                .deliver(Submission {
                    contact: ContactInfo::new(handle, "x@y.z"),
                    image: ImagePayload::from_bytes(vec![1]),
                })
                .unwrap();
        }
        let got: Vec<_> = delivery
            .submissions()
            .iter()
            .map(|s| s.contact.handle.as_str())
            .collect();
        assert_eq!(got, ["a", "b"]);
    }

    #[test]
    fn log_delivery_accepts_everything() {
        let mut delivery = LogDelivery;
        delivery
            .deliver(Submission {
                contact: ContactInfo::new("h", "e"),
                image: ImagePayload::from_bytes(Vec::new()),
            })
            .unwrap();
    }
}
