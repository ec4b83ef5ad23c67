use std::{
    net::{Shutdown, SocketAddr, TcpStream},
    sync::Arc,
    time::Duration,
};

use crate::{
    cancellation::Cancellation,
    channel::{Receiver, RecvTimeoutError},
    error::NetError,
    log::LogSink,
    sink_error, sink_info,
    transport::{RECV_TIMEOUT, UnitSender},
    unit::Unit,
};

use super::framing::{FrameWriter, LENGTH_PREFIX_SIZE};

pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Pushes units to one remote receiver over TCP, reconnecting on failure.
///
/// `Disconnected -> SendingLength -> SendingContent -> SendingLength -> ...`.
/// A socket error drops back to `Disconnected`; the next attempt happens after
/// [`RECONNECT_DELAY`] and the interrupted unit is sent again from its prefix.
pub struct PacketSender {
    logger: Arc<dyn LogSink>,
    remote: SocketAddr,
    running: Cancellation,
    stream: Option<TcpStream>,
    writer: FrameWriter,
    packets_sent: u64,
    bytes_sent: u64,
}

impl PacketSender {
    pub fn new(remote: SocketAddr, logger: Arc<dyn LogSink>, running: Cancellation) -> Self {
        Self {
            logger,
            remote,
            running,
            stream: None,
            writer: FrameWriter::new(),
            packets_sent: 0,
            bytes_sent: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Blocks until `unit` is fully written or the sender is cancelled.
    pub fn send_unit(&mut self, unit: &Unit) {
        while !self.running.expired() {
            let Some(stream) = self.stream.as_mut() else {
                if !self.connect() {
                    self.running.wait_for(RECONNECT_DELAY);
                }
                continue;
            };

            match self.writer.write_frame(stream, unit.data()) {
                Ok(()) => {
                    self.packets_sent += 1;
                    self.bytes_sent += (LENGTH_PREFIX_SIZE + unit.size()) as u64;
                    return;
                }
                Err(e) => {
                    sink_error!(self.logger, "[TCP Sender] Connection aborted due to error: {e}");
                    self.disconnect();
                }
            }
        }
    }

    fn connect(&mut self) -> bool {
        match TcpStream::connect_timeout(&self.remote, CONNECT_TIMEOUT) {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                sink_info!(self.logger, "[TCP Sender] Connected to {}", self.remote);
                self.writer.reset();
                self.stream = Some(stream);
                true
            }
            Err(e) => {
                sink_error!(self.logger, "[TCP Sender] Reconnect to {} failed: {e}", self.remote);
                false
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.writer.reset();
    }
}

impl UnitSender for PacketSender {
    fn run(&mut self, units: Receiver<Unit>) -> Result<(), NetError> {
        while !self.running.expired() {
            match units.receive_timeout(RECV_TIMEOUT) {
                Ok(unit) => self.send_unit(&unit),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.running.cancel();
        self.disconnect();
        sink_info!(
            self.logger,
            "[TCP Sender] stopped after {} packets ({} bytes)",
            self.packets_sent,
            self.bytes_sent
        );
        Ok(())
    }
}
