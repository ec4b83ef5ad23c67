use std::{
    io,
    net::{SocketAddr, UdpSocket},
    sync::Arc,
    time::Duration,
};

use crate::{
    cancellation::Cancellation,
    channel::Sender,
    error::NetError,
    log::LogSink,
    sink_debug, sink_info, sink_warn,
    transport::UnitReceiver,
    unit::Unit,
};

use super::{depacketizer::Depacketizer, fragment::Fragment, rtp_packet::Packet};

const DATAGRAM_SIZE: usize = 2048;
const READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Turns a stream of RTP datagrams back into units.
///
/// Tracks the expected sequence number. A gap, reordering or a change of
/// source puts it in drop mode; everything is discarded until the next
/// fragment carrying the Start flag. A timestamp change closes the current
/// unit, which is emitted only if its last NAL was complete.
pub struct Reassembler {
    logger: Arc<dyn LogSink>,
    depacketizer: Depacketizer,
    source: Option<SocketAddr>,
    sequence: u16,
    timestamp: u32,
    dropping: bool,
}

impl Reassembler {
    pub fn new(logger: Arc<dyn LogSink>) -> Self {
        Self {
            logger,
            depacketizer: Depacketizer::new(),
            source: None,
            sequence: 0,
            timestamp: 0,
            // nothing to continue from until the first Start fragment
            dropping: true,
        }
    }

    pub fn dropping(&self) -> bool {
        self.dropping
    }

    pub fn push(&mut self, source: SocketAddr, datagram: &[u8]) -> Option<Unit> {
        if self.source != Some(source) {
            if self.source.is_some() {
                sink_info!(self.logger, "[RTP Receiver] source changed to {source}");
            }
            self.source = Some(source);
            self.dropping = true;
        }

        let packet = Packet::new(datagram);
        if !packet.valid() {
            sink_debug!(self.logger, "[RTP Receiver] ignoring {} byte datagram", datagram.len());
            return None;
        }
        let fragment = Fragment::new(packet.payload());
        if !fragment.valid() {
            return None;
        }

        let in_sequence = packet.sequence() == self.sequence.wrapping_add(1);
        if !in_sequence && !self.dropping {
            sink_info!(
                self.logger,
                "[RTP Receiver] expected sequence {} got {}, dropping until next NAL",
                self.sequence.wrapping_add(1),
                packet.sequence()
            );
            self.dropping = true;
        }

        let mut out = None;
        if packet.timestamp() != self.timestamp {
            if self.depacketizer.complete() {
                out = Some(Unit::from_annexb(
                    self.depacketizer.take(),
                    u64::from(self.timestamp),
                ));
            }
            self.timestamp = packet.timestamp();
            self.depacketizer.clear();
        }

        let accept = if self.dropping {
            fragment.is_first()
        } else {
            in_sequence
        };
        if accept {
            if self.dropping {
                sink_info!(self.logger, "[RTP Receiver] resynchronized at {}", packet.sequence());
                self.depacketizer.clear();
            }
            self.dropping = false;
            self.sequence = packet.sequence();
            self.depacketizer.push(&fragment);
        }
        out
    }
}

/// Receives RTP/H.264 on a bound UDP socket and forwards reassembled units.
pub struct PacketReceiver {
    logger: Arc<dyn LogSink>,
    socket: UdpSocket,
    running: Cancellation,
    reassembler: Reassembler,
}

impl PacketReceiver {
    pub fn bind(
        addr: SocketAddr,
        logger: Arc<dyn LogSink>,
        running: Cancellation,
    ) -> Result<Self, NetError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(READ_TIMEOUT))?;
        sink_info!(logger, "[RTP Receiver] listening on {}", socket.local_addr()?);
        Ok(Self {
            reassembler: Reassembler::new(Arc::clone(&logger)),
            logger,
            socket,
            running,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl UnitReceiver for PacketReceiver {
    fn run(&mut self, units: Sender<Unit>) -> Result<(), NetError> {
        let mut buf = [0u8; DATAGRAM_SIZE];
        while !self.running.expired() && units.connected() {
            let (n, source) = match self.socket.recv_from(&mut buf) {
                Ok(v) => v,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    continue;
                }
                Err(e) => {
                    sink_warn!(self.logger, "[RTP Receiver] recv failed: {e}");
                    continue;
                }
            };

            if let Some(unit) = self.reassembler.push(source, &buf[..n]) {
                if units.send(unit).is_err() {
                    break;
                }
            }
        }
        sink_info!(self.logger, "[RTP Receiver] stopped");
        Ok(())
    }
}
