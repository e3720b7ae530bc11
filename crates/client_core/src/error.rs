use thiserror::Error;

/// Failure of a single call to the deck service.
///
/// Messages are captured as strings so the error can be cloned onto the
/// session event channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("deck service transport failure: {0}")]
    Transport(String),
    #[error("deck service rejected the request: {0}")]
    Rejected(String),
}

impl ServiceError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ServiceError::Transport(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Transport(format!("request timed out: {err}"))
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("history index {index} is out of range for {len} drawn cards")]
pub struct InvalidSelection {
    pub index: usize,
    pub len: usize,
}
