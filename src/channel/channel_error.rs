use std::fmt;

use thiserror::Error;

/// The receiver is gone; the unsent value is handed back.
#[derive(Error, PartialEq, Eq)]
#[error("sending on a disconnected channel")]
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SendError { .. }")
    }
}

#[derive(Error, PartialEq, Eq)]
pub enum TrySendError<T> {
    #[error("sending on a full channel")]
    Full(T),
    #[error("sending on a disconnected channel")]
    Disconnected(T),
}

impl<T> TrySendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(v) | TrySendError::Disconnected(v) => v,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TrySendError::Full(_))
    }
}

// values need not be Debug
impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => f.write_str("Full(..)"),
            TrySendError::Disconnected(_) => f.write_str("Disconnected(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvTimeoutError {
    #[error("timed out waiting on channel")]
    Timeout,
    #[error("channel is empty and disconnected")]
    Disconnected,
}
