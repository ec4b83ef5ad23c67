use std::sync::mpsc;

use crate::log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink};

/// Cloneable, non-blocking producer side of a [`Logger`](super::Logger).
///
/// Every transport gets one of these (as `Arc<dyn LogSink>`) at construction.
/// A full queue drops the message rather than stalling a network thread.
#[derive(Clone)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<LogMsg>,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = self.try_log(level, msg, target);
    }
}

impl LoggerHandle {
    /// Attempts to enqueue a log message without blocking.
    ///
    /// # Errors
    /// - `TrySendError::Full` when the bounded queue is at capacity.
    /// - `TrySendError::Disconnected` when the logger worker is gone.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), mpsc::TrySendError<LogMsg>> {
        self.tx.try_send(LogMsg::new(level, text, target))
    }
}
