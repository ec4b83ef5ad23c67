use std::{
    io::{ErrorKind, Read},
    net::{Shutdown, SocketAddr, TcpStream},
    sync::Arc,
    time::Duration,
};

use crate::{
    cancellation::Cancellation,
    channel::Sender,
    error::NetError,
    log::LogSink,
    sink_error, sink_info,
    transport::UnitReceiver,
    unit::Unit,
};

use super::{packet_parser::PacketParser, tcp_error::TcpError, tcp_sender::RECONNECT_DELAY};

const READ_BUFFER_SIZE: usize = 4096;
const READ_TIMEOUT: Duration = Duration::from_millis(250);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Connects to a broadcaster and forwards every received frame as a unit.
pub struct PacketReceiver {
    logger: Arc<dyn LogSink>,
    server: SocketAddr,
    running: Cancellation,
    packets_received: u64,
    bytes_received: u64,
}

impl PacketReceiver {
    pub fn new(server: SocketAddr, logger: Arc<dyn LogSink>, running: Cancellation) -> Self {
        Self {
            logger,
            server,
            running,
            packets_received: 0,
            bytes_received: 0,
        }
    }

    pub fn packets_received(&self) -> u64 {
        self.packets_received
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Reads frames from an established connection until the peer closes it,
    /// the stage is cancelled or the consumer goes away.
    pub fn receive_stream(
        &mut self,
        mut stream: TcpStream,
        units: &Sender<Unit>,
    ) -> Result<(), TcpError> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let mut parser = PacketParser::new();
        let mut buffer = [0u8; READ_BUFFER_SIZE];

        let result = loop {
            if self.running.expired() || !units.connected() {
                break Ok(());
            }
            let n = match stream.read(&mut buffer) {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    continue;
                }
                Err(e) => break Err(e.into()),
            };
            self.bytes_received += n as u64;

            let parsed = match parser.update(&buffer[..n]) {
                Ok(parsed) => parsed,
                Err(e) => break Err(e),
            };
            self.packets_received += parsed.len() as u64;
            if parsed.into_iter().any(|unit| units.send(unit).is_err()) {
                sink_info!(self.logger, "[TCP Receiver] consumer dropped the channel");
                break Ok(());
            }
        };

        let _ = stream.shutdown(Shutdown::Both);
        result
    }
}

impl UnitReceiver for PacketReceiver {
    fn run(&mut self, units: Sender<Unit>) -> Result<(), NetError> {
        while !self.running.expired() && units.connected() {
            sink_info!(self.logger, "[TCP Receiver] Connecting to {}", self.server);
            match TcpStream::connect_timeout(&self.server, CONNECT_TIMEOUT) {
                Ok(stream) => match self.receive_stream(stream, &units) {
                    Ok(()) => sink_info!(self.logger, "[TCP Receiver] Connection closed"),
                    Err(e) => sink_error!(self.logger, "[TCP Receiver] Receiver failed: {e}"),
                },
                Err(e) => {
                    sink_error!(self.logger, "[TCP Receiver] Failed to connect to {}: {e}", self.server)
                }
            }
            if self.running.expired() || !units.connected() {
                break;
            }
            self.running.wait_for(RECONNECT_DELAY);
        }
        self.running.cancel();
        sink_info!(
            self.logger,
            "[TCP Receiver] stopped after {} packets ({} bytes)",
            self.packets_received,
            self.bytes_received
        );
        Ok(())
    }
}
