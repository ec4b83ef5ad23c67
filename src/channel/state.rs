use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex, MutexGuard};

use super::ring_buffer::RingBuffer;

/// Shared between exactly one `Sender` and one `Receiver`.
pub(super) struct State<T> {
    buffer: Mutex<RingBuffer<T>>,
    // false -> true only
    disconnected: AtomicBool,
    pub(super) not_full: Condvar,
    pub(super) not_empty: Condvar,
}

impl<T> State<T> {
    pub(super) fn new(buffer: RingBuffer<T>) -> Self {
        Self {
            buffer: Mutex::new(buffer),
            disconnected: AtomicBool::new(false),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, RingBuffer<T>> {
        self.buffer.lock()
    }

    pub(super) fn connected(&self) -> bool {
        !self.disconnected.load(Ordering::Acquire)
    }

    /// Called from either endpoint's `Drop`.
    pub(super) fn disconnect(&self) {
        let _guard = self.buffer.lock();
        self.disconnected.store(true, Ordering::Release);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}
