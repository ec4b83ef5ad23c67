//! Runs a pipeline stage on its own thread and reports how it ended.
//!
//! A stage returning `Err`, or panicking, posts a [`StageError`] to the
//! controller's error channel instead of taking the process down.

use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, mpsc},
    thread::{self, JoinHandle},
};

use thiserror::Error;

use crate::{error::NetError, log::LogSink, sink_error, sink_info};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("stage {stage} failed: {message}")]
pub struct StageError {
    pub stage: String,
    pub message: String,
}

pub struct Stage {
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl Stage {
    pub fn spawn<F>(
        name: &str,
        logger: Arc<dyn LogSink>,
        errors: mpsc::Sender<StageError>,
        f: F,
    ) -> io::Result<Self>
    where
        F: FnOnce() -> Result<(), NetError> + Send + 'static,
    {
        let stage = name.to_owned();
        let handle = thread::Builder::new().name(stage.clone()).spawn(move || {
            let message = match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(Ok(())) => {
                    sink_info!(logger, "[Stage] {stage} finished");
                    return;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };
            sink_error!(logger, "[Stage] {stage} failed: {message}");
            // the controller may already be gone
            let _ = errors.send(StageError { stage, message });
        })?;

        Ok(Self {
            name: name.to_owned(),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the stage thread. Errors were already reported on the
    /// error channel.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        self.join();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::{log::NoopLogSink, tcp::TcpError};

    fn logger() -> Arc<dyn LogSink> {
        Arc::new(NoopLogSink)
    }

    #[test]
    fn test_ok_stage_reports_nothing() {
        let (tx, rx) = mpsc::channel();
        let mut stage = Stage::spawn("quiet", logger(), tx, || Ok(())).unwrap();
        stage.join();
        assert!(stage.is_finished());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_error_is_posted() {
        let (tx, rx) = mpsc::channel();
        let mut stage = Stage::spawn("sender", logger(), tx, || {
            Err(TcpError::PacketTooLarge(9).into())
        })
        .unwrap();
        stage.join();
        let err = rx.recv().unwrap();
        assert_eq!(err.stage, "sender");
        assert!(err.message.contains("too big"));
    }

    #[test]
    fn test_panic_is_posted() {
        let (tx, rx) = mpsc::channel();
        let stage = Stage::spawn("boom", logger(), tx, || panic!("kaput")).unwrap();
        assert_eq!(stage.name(), "boom");
        drop(stage);
        let err = rx.recv().unwrap();
        assert_eq!(err, StageError { stage: "boom".into(), message: "kaput".into() });
    }
}
