//! Bounded single-producer/single-consumer channel connecting pipeline stages.
//!
//! Backpressure is the only flow control: `send` blocks while the ring buffer
//! is full. Dropping either endpoint marks the channel disconnected and wakes
//! the other side, which is the only way to unblock a pending `send` or
//! `receive`. Stop downstream consumers before tearing down upstream producers.

pub mod channel_error;
pub mod receiver;
pub mod ring_buffer;
pub mod sender;
mod state;

use std::sync::Arc;

pub use channel_error::{RecvTimeoutError, SendError, TrySendError};
pub use receiver::Receiver;
pub use sender::Sender;

use ring_buffer::RingBuffer;
use state::State;

/// Creates a connected `(Sender, Receiver)` pair holding at most `capacity`
/// values. A capacity of 0 is treated as 1.
pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let state = Arc::new(State::new(RingBuffer::with_capacity(capacity.max(1))));
    (Sender::new(Arc::clone(&state)), Receiver::new(state))
}
