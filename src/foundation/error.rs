use crate::camera::device::CameraError;

pub type BoothResult<T> = Result<T, BoothError>;

#[derive(thiserror::Error, Debug)]
pub enum BoothError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("compose error: {0}")]
    Compose(String),

    #[error("flow error: {0}")]
    Flow(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoothError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn compose(msg: impl Into<String>) -> Self {
        Self::Compose(msg.into())
    }

    pub fn flow(msg: impl Into<String>) -> Self {
        Self::Flow(msg.into())
    }
}
