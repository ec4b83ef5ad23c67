use std::sync::Arc;

use super::channel_error::{SendError, TrySendError};
use super::state::State;

/// Producer endpoint. Not `Clone`: a channel has exactly one producer.
pub struct Sender<T> {
    state: Arc<State<T>>,
}

impl<T> Sender<T> {
    pub(super) fn new(state: Arc<State<T>>) -> Self {
        Self { state }
    }

    /// Blocks while the buffer is full and the receiver is alive.
    ///
    /// # Errors
    /// Returns the value inside [`SendError`] if the receiver was dropped,
    /// either before the call or while waiting for room.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let mut buffer = self.state.lock();
        while self.state.connected() && buffer.is_full() {
            self.state.not_full.wait(&mut buffer);
        }

        if !self.state.connected() {
            return Err(SendError(value));
        }

        buffer.push(value).map_err(SendError)?;
        self.state.not_empty.notify_one();
        Ok(())
    }

    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut buffer = self.state.lock();
        if !self.state.connected() {
            return Err(TrySendError::Disconnected(value));
        }

        buffer.push(value).map_err(TrySendError::Full)?;
        self.state.not_empty.notify_one();
        Ok(())
    }

    pub fn connected(&self) -> bool {
        self.state.connected()
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity()
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        self.state.disconnect();
    }
}
