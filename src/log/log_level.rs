use std::fmt;

/// Defines the severity levels for log messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-packet chatter (fragments, partial writes).
    Trace,
    /// State machine transitions worth seeing while debugging a stream.
    Debug,
    /// Connections, recoveries, stage start/stop.
    Info,
    /// Dropped packets, overflown clients, failed best-effort steps.
    Warn,
    /// Socket failures and setup errors.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LogLevel::*;
        let s = match self {
            Trace => "TRACE",
            Debug => "DEBUG",
            Info => "INFO",
            Warn => "WARN",
            Error => "ERROR",
        };
        f.write_str(s)
    }
}
