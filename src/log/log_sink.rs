use crate::log::log_level::LogLevel;

/// Destination for diagnostics. Components receive one as `Arc<dyn LogSink>`.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
