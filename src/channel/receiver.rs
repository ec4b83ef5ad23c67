use std::sync::Arc;
use std::time::{Duration, Instant};

use super::channel_error::RecvTimeoutError;
use super::state::State;

/// Consumer endpoint.
pub struct Receiver<T> {
    state: Arc<State<T>>,
}

impl<T> Receiver<T> {
    pub(super) fn new(state: Arc<State<T>>) -> Self {
        Self { state }
    }

    /// Blocks until a value arrives. `None` once the sender is gone and the
    /// buffer has been drained.
    pub fn receive(&self) -> Option<T> {
        let mut buffer = self.state.lock();
        while self.state.connected() && buffer.is_empty() {
            self.state.not_empty.wait(&mut buffer);
        }

        let value = buffer.pop()?;
        self.state.not_full.notify_one();
        Some(value)
    }

    pub fn try_receive(&self) -> Option<T> {
        let value = self.state.lock().pop()?;
        self.state.not_full.notify_one();
        Some(value)
    }

    /// Bounded wait, for loops that also poll a cancellation flag.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut buffer = self.state.lock();

        loop {
            if let Some(value) = buffer.pop() {
                self.state.not_full.notify_one();
                return Ok(value);
            }
            if !self.state.connected() {
                return Err(RecvTimeoutError::Disconnected);
            }
            if self
                .state
                .not_empty
                .wait_until(&mut buffer, deadline)
                .timed_out()
            {
                return match buffer.pop() {
                    Some(value) => {
                        self.state.not_full.notify_one();
                        Ok(value)
                    }
                    None => Err(RecvTimeoutError::Timeout),
                };
            }
        }
    }

    pub fn connected(&self) -> bool {
        self.state.connected()
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.state.disconnect();
    }
}
