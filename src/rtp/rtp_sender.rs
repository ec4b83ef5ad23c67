use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
    sync::Arc,
    thread,
    time::Duration,
};

use crate::{
    cancellation::Cancellation,
    channel::{Receiver, RecvTimeoutError},
    error::NetError,
    log::LogSink,
    sink_debug, sink_info, sink_warn,
    transport::{RECV_TIMEOUT, UnitSender},
    unit::Unit,
};

use super::{PAYLOAD_TYPE_H264, RTP_VERSION, fragment::Fragment, packetizer::Packetizer, rtp_packet::Packet};

/// Packets sent back to back before yielding for [`PACING_PAUSE`].
const PACING_BURST: u64 = 128;
const PACING_PAUSE: Duration = Duration::from_millis(1);

/// Streams units as RTP/H.264 (FU-A only) to one UDP peer.
///
/// Sequence numbers start at 0 and wrap at 16 bits; the RTP timestamp is the
/// unit timestamp truncated to 32 bits. SSRC is 0, no CSRCs.
pub struct PacketSender {
    logger: Arc<dyn LogSink>,
    socket: UdpSocket,
    running: Cancellation,
    mtu: usize,
    sequence: u16,
    packets_sent: u64,
    buffer: Vec<u8>,
}

impl PacketSender {
    /// Binds an ephemeral local port and connects it to `remote`.
    pub fn connect(
        remote: SocketAddr,
        mtu: usize,
        logger: Arc<dyn LogSink>,
        running: Cancellation,
    ) -> Result<Self, NetError> {
        let local: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(remote)?;
        sink_info!(
            logger,
            "[RTP Sender] {} -> {} (mtu {})",
            socket.local_addr()?,
            remote,
            mtu
        );

        let mtu = mtu.max(1);
        Ok(Self {
            logger,
            socket,
            running,
            mtu,
            sequence: 0,
            packets_sent: 0,
            buffer: vec![0u8; Packet::<&[u8]>::MIN_SIZE + Fragment::<&[u8]>::MIN_SIZE + mtu],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Packetizes and sends one unit. Returns the number of packets put on
    /// the wire; send failures are logged and the packet is skipped.
    pub fn send_unit(&mut self, unit: &Unit) -> usize {
        let mut sent = 0;
        let timestamp = unit.timestamp() as u32;
        let mut chunks = Packetizer::new(self.mtu, unit.data()).peekable();

        while let Some(chunk) = chunks.next() {
            let last = chunks.peek().is_none();
            let size = {
                let mut packet = Packet::new(&mut self.buffer[..]);
                packet.set_version(RTP_VERSION);
                packet.set_has_padding(false);
                packet.set_has_extensions(false);
                packet.set_contributors_count(0);
                packet.set_marked(last);
                packet.set_payload_type(PAYLOAD_TYPE_H264);
                packet.set_sequence(self.sequence);
                packet.set_timestamp(timestamp);
                packet.set_stream_id(0);
                Packet::<&[u8]>::MIN_SIZE + chunk.write_into(packet.payload_mut())
            };
            self.sequence = self.sequence.wrapping_add(1);

            match self.socket.send(&self.buffer[..size]) {
                Ok(_) => sent += 1,
                // ICMP port unreachable from an earlier datagram, peer not up yet
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                    sink_debug!(self.logger, "[RTP Sender] peer refused datagram: {e}");
                }
                Err(e) => sink_warn!(self.logger, "[RTP Sender] send failed: {e}"),
            }

            self.packets_sent += 1;
            if self.packets_sent % PACING_BURST == 0 {
                thread::sleep(PACING_PAUSE);
            }
        }
        sent
    }
}

impl UnitSender for PacketSender {
    fn run(&mut self, units: Receiver<Unit>) -> Result<(), NetError> {
        while !self.running.expired() {
            match units.receive_timeout(RECV_TIMEOUT) {
                Ok(unit) => {
                    self.send_unit(&unit);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    sink_info!(self.logger, "[RTP Sender] unit channel closed");
                    break;
                }
            }
        }
        sink_info!(self.logger, "[RTP Sender] stopped after {} packets", self.packets_sent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;

    fn pair(mtu: usize) -> (PacketSender, UdpSocket) {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let sender = PacketSender::connect(
            peer.local_addr().unwrap(),
            mtu,
            Arc::new(NoopLogSink),
            Cancellation::new(),
        )
        .unwrap();
        (sender, peer)
    }

    #[test]
    fn packets_carry_header_fields_and_marker_on_last() {
        let (mut sender, peer) = pair(4);
        let mut data = vec![0, 0, 1, 0x65];
        data.extend(1..=10u8);
        let unit = Unit::from_annexb(data, 0x1_0000_0005);

        assert_eq!(sender.send_unit(&unit), 3);

        let mut buf = [0u8; 64];
        for seq in 0..3u16 {
            let n = peer.recv(&mut buf).unwrap();
            let packet = Packet::new(&buf[..n]);
            assert!(packet.valid());
            assert_eq!(packet.version(), RTP_VERSION);
            assert_eq!(packet.payload_type(), PAYLOAD_TYPE_H264);
            assert_eq!(packet.sequence(), seq);
            // truncated to 32 bits
            assert_eq!(packet.timestamp(), 5);
            assert_eq!(packet.stream_id(), 0);
            assert_eq!(packet.contributors_count(), 0);
            assert_eq!(packet.marked(), seq == 2);

            let fragment = Fragment::new(packet.payload());
            assert_eq!(fragment.nal_type(), 5);
            assert_eq!(fragment.is_first(), seq == 0);
            assert_eq!(fragment.is_last(), seq == 2);
        }
    }

    #[test]
    fn sequence_wraps_at_16_bits() {
        let (mut sender, peer) = pair(1400);
        sender.sequence = u16::MAX;
        sender.send_unit(&Unit::from_annexb(vec![0, 0, 1, 0x41, 7], 0));

        let mut buf = [0u8; 64];
        let n = peer.recv(&mut buf).unwrap();
        assert_eq!(Packet::new(&buf[..n]).sequence(), u16::MAX);
        let n = peer.recv(&mut buf).unwrap();
        assert_eq!(Packet::new(&buf[..n]).sequence(), 0);
    }
}
