//! RTP transport for H.264 over lossy UDP.
//!
//! - [`rtp_packet::Packet`] / [`fragment::Fragment`]: zero-copy views over
//!   caller-owned buffers (RFC 3550 header, RFC 6184 FU-A).
//! - [`packetizer::Packetizer`] / [`depacketizer::Depacketizer`]: NAL <-> FU-A.
//! - [`rtp_sender::PacketSender`] / [`rtp_receiver::PacketReceiver`]: socket I/O,
//!   sequencing and loss recovery at NAL boundaries.

pub mod depacketizer;
pub mod fragment;
pub mod packetizer;
pub mod rtp_packet;
pub mod rtp_receiver;
pub mod rtp_sender;

pub use depacketizer::Depacketizer;
pub use fragment::Fragment;
pub use packetizer::{FuChunk, Packetizer};
pub use rtp_packet::Packet;
pub use rtp_receiver::{PacketReceiver, Reassembler};
pub use rtp_sender::PacketSender;

pub const RTP_VERSION: u8 = 2;
/// Dynamic payload type used for H.264.
pub const PAYLOAD_TYPE_H264: u8 = 96;
pub const DEFAULT_MTU: usize = 1400;
