use std::time::{SystemTime, UNIX_EPOCH};

use crate::log::log_level::LogLevel;

/// Represents a single log message event.
#[derive(Debug, Clone)]
pub struct LogMsg {
    /// The severity level of the log.
    pub level: LogLevel,
    /// Milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    /// The message content.
    pub text: String,
    /// Module path the message originated from.
    pub target: &'static str,
}

impl LogMsg {
    /// Creates a new `LogMsg` stamped with the current time.
    ///
    /// ```rust,ignore
    /// let msg = LogMsg::new(LogLevel::Info, "client connected", module_path!());
    /// ```
    pub fn new(level: LogLevel, text: impl Into<String>, target: &'static str) -> Self {
        Self {
            level,
            ts_ms: now_millis(),
            text: text.into(),
            target,
        }
    }
}

/// Wall-clock milliseconds, 0 if the clock is before the epoch.
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
